//! Pure helpers behind the record views: search, table rows and the symptom input.

use chrono::SecondsFormat;
use ehr_core::constants::SYMPTOM_ENTITY_TYPE;
use ehr_core::{ClinicalEntity, EhrRecord};

const NOT_AVAILABLE: &str = "N/A";
const UNKNOWN: &str = "Unknown";

/// Records whose first given name, patient id or summary contains `term`, ignoring case.
/// An empty term keeps everything.
pub fn filter_records<'a>(records: &'a [EhrRecord], term: &str) -> Vec<&'a EhrRecord> {
    let term = term.trim().to_lowercase();
    records
        .iter()
        .filter(|record| {
            term.is_empty()
                || [
                    record.given_name().unwrap_or_default(),
                    record.patient_id.as_str(),
                    record.summary.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        })
        .collect()
}

/// Parses the comma-separated symptom input into `Symptom` entities. Blank items are dropped.
pub fn symptom_entities(csv: &str) -> Vec<ClinicalEntity> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ClinicalEntity::new(s, SYMPTOM_ENTITY_TYPE))
        .collect()
}

/// One line of the records table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRow {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub condition: String,
    pub symptoms: String,
    pub medications: String,
    pub last_visit: String,
    pub created_at: String,
}

impl From<&EhrRecord> for RecordRow {
    fn from(record: &EhrRecord) -> Self {
        let condition = record
            .summary
            .as_str()
            .split('.')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string();

        let symptoms = or_not_available(
            record
                .entities_of_type(SYMPTOM_ENTITY_TYPE)
                .collect::<Vec<_>>()
                .join(", "),
        );

        let medications = or_not_available(
            record
                .content
                .medications
                .iter()
                .map(|m| {
                    format!(
                        "{} ({})",
                        m.name.as_deref().unwrap_or(UNKNOWN),
                        m.dosage.as_deref().unwrap_or("-")
                    )
                })
                .collect::<Vec<_>>()
                .join(", "),
        );

        Self {
            id: record.id.to_string(),
            patient_id: record.patient_id.to_string(),
            name: record.given_name().unwrap_or(UNKNOWN).to_string(),
            condition,
            symptoms,
            medications,
            last_visit: record.created_at.format("%Y-%m-%d").to_string(),
            created_at: record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

fn or_not_available(value: String) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ehr_core::{ClinicalContent, HumanName, Medication, NonEmptyText, PatientInfo, RecordId};

    fn record(patient_id: &str, given: Option<&str>, summary: &str) -> EhrRecord {
        EhrRecord {
            id: RecordId::new(),
            patient_id: NonEmptyText::new(patient_id).unwrap(),
            summary: NonEmptyText::new(summary).unwrap(),
            content: ClinicalContent {
                patient: PatientInfo {
                    name: HumanName {
                        given: given.map(|g| vec![g.to_string()]).unwrap_or_default(),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                ..Default::default()
            },
            created_at: Utc.with_ymd_and_hms(2024, 6, 2, 14, 5, 0).unwrap(),
        }
    }

    #[test]
    fn filter_matches_name_id_or_summary() {
        let records = vec![
            record("P1001", Some("Vinayak"), "Fever and body pain."),
            record("P2002", Some("Asha"), "Hypertension review."),
            record("X9", None, "Routine check."),
        ];

        let ids = |term: &str| -> Vec<String> {
            filter_records(&records, term)
                .into_iter()
                .map(|r| r.patient_id.to_string())
                .collect()
        };

        assert_eq!(ids("vina"), vec!["P1001"]);
        assert_eq!(ids("p2002"), vec!["P2002"]);
        assert_eq!(ids("ROUTINE"), vec!["X9"]);
        assert_eq!(ids(""), vec!["P1001", "P2002", "X9"]);
        assert!(ids("nothing").is_empty());
    }

    #[test]
    fn row_uses_fallbacks() {
        let row = RecordRow::from(&record("P1", None, "Flu"));

        assert_eq!(row.name, "Unknown");
        assert_eq!(row.condition, "Flu");
        assert_eq!(row.symptoms, "N/A");
        assert_eq!(row.medications, "N/A");
        assert_eq!(row.last_visit, "2024-06-02");
    }

    #[test]
    fn row_formats_clinical_columns() {
        let mut rec = record("P1", Some("John"), "Hypertension. Improving on treatment.");
        rec.content.entities = symptom_entities("Headaches, Dizziness");
        rec.content.entities.push(ClinicalEntity::new("HCTZ", "Medication"));
        rec.content.medications = vec![
            Medication {
                name: Some("Lisinopril".into()),
                dosage: Some("10mg".into()),
                ..Default::default()
            },
            Medication::default(),
        ];

        let row = RecordRow::from(&rec);
        assert_eq!(row.name, "John");
        assert_eq!(row.condition, "Hypertension");
        assert_eq!(row.symptoms, "Headaches, Dizziness");
        assert_eq!(row.medications, "Lisinopril (10mg), Unknown (-)");
    }

    #[test]
    fn symptom_input_drops_blanks() {
        let entities = symptom_entities(" fever, ,cough ,");
        assert_eq!(
            entities,
            vec![
                ClinicalEntity::new("fever", "Symptom"),
                ClinicalEntity::new("cough", "Symptom"),
            ]
        );
        assert!(symptom_entities("").is_empty());
    }
}
