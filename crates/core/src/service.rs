//! Record Service: CRUD over the record store.
//!
//! Each operation is a single stateless exchange with the store. The service owns the rules
//! stores do not know about: required-field validation, identifier and timestamp
//! assignment, result ordering and the NotFound signal.

use crate::record::{EhrRecord, RecordDraft};
use crate::store::RecordStore;
use crate::validation::validate_required;
use crate::{RecordError, RecordResult};
use chrono::{DateTime, Duration, DurationRound, Utc};
use ehr_uuid::RecordId;
use std::sync::{Arc, Mutex};

/// Pure record operations - no API concerns.
#[derive(Clone, Debug)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    last_created_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            last_created_at: Arc::new(Mutex::new(None)),
        }
    }

    /// Validates and stores a new record.
    ///
    /// # Returns
    ///
    /// The stored record, including its assigned identifier and `created_at`.
    ///
    /// # Errors
    ///
    /// - `RecordError::Validation` if `patientId` or `summary` is missing or blank
    /// - a store error if persistence fails
    pub fn create(&self, draft: RecordDraft) -> RecordResult<EhrRecord> {
        let required = validate_required(&draft)?;

        let record = EhrRecord {
            id: RecordId::new(),
            patient_id: required.patient_id,
            summary: required.summary,
            content: draft.content,
            created_at: self.next_created_at(),
        };

        self.store.insert(&record)?;
        tracing::info!(id = %record.id, patient_id = %record.patient_id, "EHR record created");
        Ok(record)
    }

    /// All records, newest `created_at` first.
    pub fn list_all(&self) -> RecordResult<Vec<EhrRecord>> {
        let mut records = self.store.all()?;
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        tracing::debug!(count = records.len(), "listed EHR records");
        Ok(records)
    }

    /// The first record whose `patientId` matches exactly.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` when no record matches.
    pub fn get_by_patient_id(&self, patient_id: &str) -> RecordResult<EhrRecord> {
        tracing::debug!(patient_id, "looking up EHR record by patient id");
        self.store
            .find_by_patient_id(patient_id)?
            .ok_or_else(|| RecordError::NotFound(format!("patientId {patient_id}")))
    }

    /// The record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` for unknown identifiers and for strings that are not
    /// canonical record ids.
    pub fn get_by_id(&self, id: &str) -> RecordResult<EhrRecord> {
        let record_id = parse_id(id)?;
        self.store
            .get(&record_id)?
            .ok_or_else(|| RecordError::NotFound(format!("id {id}")))
    }

    /// Replaces the whole document stored under `id`.
    ///
    /// The identifier and `created_at` of the stored record are kept; every other field is
    /// taken from `draft`, so fields absent from the draft are cleared.
    ///
    /// # Errors
    ///
    /// - `RecordError::NotFound` if no record has that identifier
    /// - `RecordError::Validation` if the draft lacks a required field
    pub fn update_by_id(&self, id: &str, draft: RecordDraft) -> RecordResult<EhrRecord> {
        let existing = self.get_by_id(id)?;
        let required = validate_required(&draft)?;

        let record = EhrRecord {
            id: existing.id,
            patient_id: required.patient_id,
            summary: required.summary,
            content: draft.content,
            created_at: existing.created_at,
        };

        if !self.store.replace(&record)? {
            return Err(RecordError::NotFound(format!("id {id}")));
        }
        tracing::info!(id = %record.id, "EHR record updated");
        Ok(record)
    }

    /// Removes the record stored under `id` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no record has that identifier.
    pub fn delete_by_id(&self, id: &str) -> RecordResult<EhrRecord> {
        let record_id = parse_id(id)?;
        let removed = self
            .store
            .remove(&record_id)?
            .ok_or_else(|| RecordError::NotFound(format!("id {id}")))?;
        tracing::info!(id = %removed.id, "EHR record deleted");
        Ok(removed)
    }

    /// Creation timestamp at millisecond precision, strictly after any previously issued one.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = now
            .duration_trunc(Duration::milliseconds(1))
            .unwrap_or(now);

        let mut last = self
            .last_created_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let timestamp = match *last {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(timestamp);
        timestamp
    }
}

fn parse_id(id: &str) -> RecordResult<RecordId> {
    RecordId::parse(id).map_err(|_| RecordError::NotFound(format!("id {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ClinicalContent, Medication};
    use crate::store::{FileRecordStore, InMemoryRecordStore};
    use crate::ErrorKind;
    use tempfile::TempDir;

    fn memory_service() -> RecordService {
        RecordService::new(Arc::new(InMemoryRecordStore::new()))
    }

    fn draft(patient_id: &str, summary: &str) -> RecordDraft {
        RecordDraft {
            patient_id: Some(patient_id.to_string()),
            summary: Some(summary.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_assigns_id_and_created_at() {
        let service = memory_service();
        let before = Utc::now() - Duration::seconds(1);

        let record = service.create(draft("P1001", "Flu")).expect("create should succeed");

        assert!(RecordId::is_canonical(&record.id.to_string()));
        assert!(record.created_at >= before);
        assert_eq!(record.patient_id, "P1001");
        assert_eq!(record.summary, "Flu");
        assert!(record.content.medications.is_empty());
    }

    #[test]
    fn test_create_without_summary_fails_validation() {
        let service = memory_service();
        let err = service
            .create(RecordDraft {
                patient_id: Some("P1001".into()),
                ..Default::default()
            })
            .expect_err("missing summary should fail");

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(service.list_all().unwrap().is_empty(), "nothing stored");
    }

    #[test]
    fn test_list_all_newest_first() {
        let service = memory_service();
        let a = service.create(draft("A", "earlier")).unwrap();
        let b = service.create(draft("B", "later")).unwrap();

        let listed: Vec<_> = service.list_all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![b.id, a.id]);
        assert!(b.created_at > a.created_at, "created_at strictly increases");
    }

    #[test]
    fn test_list_all_is_idempotent() {
        let service = memory_service();
        for i in 0..5 {
            service.create(draft(&format!("P{i}"), "s")).unwrap();
        }

        assert_eq!(service.list_all().unwrap(), service.list_all().unwrap());
    }

    #[test]
    fn test_get_by_patient_id() {
        let service = memory_service();
        let created = service.create(draft("P1001", "Flu")).unwrap();

        assert_eq!(service.get_by_patient_id("P1001").unwrap(), created);

        let err = service.get_by_patient_id("UNKNOWN").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_by_id_preserves_medication_order() {
        let service = memory_service();
        let mut input = draft("P1", "Hypertension follow-up");
        input.content = ClinicalContent {
            medications: vec![
                Medication {
                    name: Some("Lisinopril".into()),
                    dosage: Some("10mg".into()),
                    ..Default::default()
                },
                Medication {
                    name: Some("HCTZ".into()),
                    dosage: Some("25mg".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let created = service.create(input).unwrap();

        let fetched = service.get_by_id(&created.id.to_string()).unwrap();
        let names: Vec<_> = fetched
            .content
            .medications
            .iter()
            .map(|m| m.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["Lisinopril", "HCTZ"]);
    }

    #[test]
    fn test_get_by_id_with_malformed_id_is_not_found() {
        let service = memory_service();
        assert!(service.get_by_id("not-an-id").unwrap_err().is_not_found());
        assert!(service
            .get_by_id(&RecordId::new().to_string())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_update_replaces_document_but_keeps_identity() {
        let service = memory_service();
        let mut input = draft("P1", "Flu");
        input.content.allergies = vec!["Penicillin".into()];
        let created = service.create(input).unwrap();

        let updated = service
            .update_by_id(&created.id.to_string(), draft("P1", "Recovered"))
            .expect("update should succeed");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.summary, "Recovered");
        assert!(updated.content.allergies.is_empty(), "full replace clears fields");
        assert_eq!(service.get_by_id(&created.id.to_string()).unwrap(), updated);
    }

    #[test]
    fn test_update_validates_and_reports_missing() {
        let service = memory_service();
        let created = service.create(draft("P1", "Flu")).unwrap();

        let err = service
            .update_by_id(&created.id.to_string(), RecordDraft::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .update_by_id(&RecordId::new().to_string(), draft("P1", "x"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_removes_from_listing() {
        let service = memory_service();
        let keep = service.create(draft("P1", "keep")).unwrap();
        let gone = service.create(draft("P2", "gone")).unwrap();

        let removed = service.delete_by_id(&gone.id.to_string()).unwrap();
        assert_eq!(removed.id, gone.id);

        let ids: Vec<_> = service.list_all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![keep.id]);

        let err = service.delete_by_id(&gone.id.to_string()).unwrap_err();
        assert!(err.is_not_found(), "second delete must not succeed");
    }

    #[test]
    fn test_file_backed_service_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let service = RecordService::new(Arc::new(store));

        let a = service.create(draft("P1", "first")).unwrap();
        let b = service.create(draft("P2", "second")).unwrap();

        let listed = service.list_all().unwrap();
        assert_eq!(listed, vec![b.clone(), a.clone()]);
        assert_eq!(service.get_by_patient_id("P1").unwrap(), a);
    }

    #[test]
    fn test_list_all_reports_lost_records_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let records_dir = store.records_dir().to_path_buf();
        let service = RecordService::new(Arc::new(store));
        service.create(draft("P1", "first")).unwrap();

        std::fs::remove_dir_all(&records_dir).unwrap();
        std::fs::write(&records_dir, "not a directory").unwrap();

        let err = service.list_all().expect_err("store failure must not look like an empty list");
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
