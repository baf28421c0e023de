use anyhow::Context;
use clap::{Parser, Subcommand};
use ehr_client::{filter_records, RecordRow};
use ehr_core::{
    fhir_bundle, format_elapsed, store_location_from_env_value, AudioCapture, Consultation,
    CoreConfig, RecordDraft, RecordService, SimulatedExtractor, StoreLocation,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ehr")]
#[command(about = "EHR record store CLI")]
struct Cli {
    /// Data directory, `file://<dir>` or `memory://` (defaults to EHR_DATABASE_URL)
    #[arg(long, global = true)]
    data: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List records, newest first
    List {
        /// Only records whose name, patient id or summary contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the record for a patient id
    Show { patient_id: String },
    /// Show a record by its identifier
    Get { id: String },
    /// Create a record from a JSON file
    Create { file: PathBuf },
    /// Replace a record with the contents of a JSON file
    Update { id: String, file: PathBuf },
    /// Delete a record
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print a record as a FHIR Bundle
    ExportFhir { id: String },
    /// Run a simulated consultation for a patient
    Consult {
        patient_id: String,
        /// Store the extraction as a new record
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ehr_core=warn".parse()?)
                .add_directive("ehr=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'ehr --help' for commands");
        return Ok(());
    };

    let location = store_location_from_env_value(
        cli.data.or_else(|| std::env::var("EHR_DATABASE_URL").ok()),
    )?;
    if location == StoreLocation::Memory {
        eprintln!("Note: memory:// store is discarded when this command exits.");
    }
    let service = RecordService::new(CoreConfig::new(location).open_store()?);

    match command {
        Commands::List { search } => {
            let records = service.list_all()?;
            let shown = filter_records(&records, search.as_deref().unwrap_or_default());
            if shown.is_empty() {
                println!("No records found.");
            }
            for record in &shown {
                let row = RecordRow::from(*record);
                println!(
                    "ID: {}, Patient: {}, Name: {}, Condition: {}, Symptoms: {}, Medications: {}, Last visit: {}",
                    row.id,
                    row.patient_id,
                    row.name,
                    row.condition,
                    row.symptoms,
                    row.medications,
                    row.last_visit
                );
            }
            println!("Showing {} of {} records", shown.len(), records.len());
        }
        Commands::Show { patient_id } => {
            print_json(&service.get_by_patient_id(&patient_id)?)?;
        }
        Commands::Get { id } => {
            print_json(&service.get_by_id(&id)?)?;
        }
        Commands::Create { file } => {
            let record = service.create(read_draft(&file)?)?;
            tracing::info!(id = %record.id, file = %file.display(), "created record from file");
            println!("EHR stored successfully: {}", record.id);
        }
        Commands::Update { id, file } => {
            let record = service.update_by_id(&id, read_draft(&file)?)?;
            tracing::info!(id = %record.id, file = %file.display(), "replaced record from file");
            println!("EHR updated successfully: {}", record.id);
        }
        Commands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete record {id}?"))? {
                println!("Cancelled.");
                return Ok(());
            }
            let record = service.delete_by_id(&id)?;
            tracing::info!(id = %record.id, "deleted record");
            println!("EHR deleted successfully: {}", record.id);
        }
        Commands::ExportFhir { id } => {
            print_json(&fhir_bundle(&service.get_by_id(&id)?))?;
        }
        Commands::Consult { patient_id, save } => {
            let mut consultation = Consultation::new(SimulatedExtractor::default());
            let mut phases = consultation.subscribe();
            let watcher = tokio::spawn(async move {
                while phases.changed().await.is_ok() {
                    let phase = *phases.borrow_and_update();
                    println!("Consultation {phase}...");
                }
            });

            let extraction = consultation.record(AudioCapture::default()).await?;
            println!("Recorded {}", format_elapsed(consultation.elapsed().as_secs()));
            println!("Name: {}", extraction.name);
            println!("Disease: {}", extraction.disease);
            println!("Symptoms: {}", extraction.symptoms.join(", "));
            println!("Medications: {}", extraction.medications.join(", "));
            println!("Notes: {}", extraction.notes);

            if save {
                let record = service.create(extraction.into_draft(patient_id))?;
                tracing::info!(id = %record.id, "saved consultation as record");
                println!("EHR stored successfully: {}", record.id);
            }
            drop(consultation);
            watcher.await.ok();
        }
    }

    Ok(())
}

fn read_draft(path: &Path) -> anyhow::Result<RecordDraft> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid record JSON in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
