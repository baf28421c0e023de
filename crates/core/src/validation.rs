//! Input validation for record drafts.
//!
//! Only the two schema-required fields are checked; everything else in a draft is optional
//! free text and is stored as given.

use crate::constants::RECORD_MODEL_NAME;
use crate::record::RecordDraft;
use crate::{RecordError, RecordResult};
use ehr_types::NonEmptyText;

/// The required fields of a draft, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    pub patient_id: NonEmptyText,
    pub summary: NonEmptyText,
}

/// Checks that `patientId` and `summary` are present and not blank.
///
/// # Errors
///
/// Returns `RecordError::Validation` naming every missing path, worded like a document-schema
/// validator, e.g. ``Ehr validation failed: summary: Path `summary` is required.``
pub fn validate_required(draft: &RecordDraft) -> RecordResult<RequiredFields> {
    let patient_id = draft.patient_id.as_deref().map(NonEmptyText::new);
    let summary = draft.summary.as_deref().map(NonEmptyText::new);

    match (patient_id, summary) {
        (Some(Ok(patient_id)), Some(Ok(summary))) => Ok(RequiredFields {
            patient_id,
            summary,
        }),
        (patient_id, summary) => {
            let mut missing = Vec::new();
            if !matches!(patient_id, Some(Ok(_))) {
                missing.push("patientId");
            }
            if !matches!(summary, Some(Ok(_))) {
                missing.push("summary");
            }
            Err(RecordError::Validation(required_message(&missing)))
        }
    }
}

fn required_message(paths: &[&str]) -> String {
    let details = paths
        .iter()
        .map(|path| format!("{path}: Path `{path}` is required."))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{RECORD_MODEL_NAME} validation failed: {details}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(patient_id: Option<&str>, summary: Option<&str>) -> RecordDraft {
        RecordDraft {
            patient_id: patient_id.map(str::to_string),
            summary: summary.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_both_fields() {
        let fields = validate_required(&draft(Some("P1001"), Some("Flu"))).unwrap();
        assert_eq!(fields.patient_id, "P1001");
        assert_eq!(fields.summary, "Flu");
    }

    #[test]
    fn missing_summary_is_named() {
        let err = validate_required(&draft(Some("P1001"), None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ehr validation failed: summary: Path `summary` is required."
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = validate_required(&draft(Some("  "), Some(""))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ehr validation failed: patientId: Path `patientId` is required., \
             summary: Path `summary` is required."
        );
    }
}
