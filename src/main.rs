use ehr_core::{CoreConfig, RecordService, store_location_from_env_value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedAI EHR backend
///
/// Opens the configured record store and serves the REST API (with Swagger UI) until the
/// process stops.
///
/// # Environment Variables
/// - `PORT`: listening port (default: 5000)
/// - `EHR_REST_ADDR`: full bind address, overrides `PORT`
/// - `EHR_DATABASE_URL`: `memory://`, `file://<dir>` or a directory (default: "ehr_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the store location is invalid or cannot be opened, or
/// - the server address cannot be bound or the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medai_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("ehr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let location = store_location_from_env_value(std::env::var("EHR_DATABASE_URL").ok())?;
    tracing::info!(?location, "opening EHR record store");
    let cfg = CoreConfig::new(location);
    let service = RecordService::new(cfg.open_store()?);

    let rest_addr = api_rest::rest_addr_from_env(
        std::env::var("EHR_REST_ADDR").ok(),
        std::env::var("PORT").ok(),
    );
    api_rest::serve(&rest_addr, service).await
}
