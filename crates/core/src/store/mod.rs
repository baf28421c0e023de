//! Record Store: persistence of EHR records.
//!
//! The [`RecordStore`] trait is the seam between the service and its storage. Two
//! implementations are provided:
//!
//! - [`InMemoryRecordStore`] keeps records in a vector (tests, ephemeral servers).
//! - [`FileRecordStore`] keeps one JSON document per record in a sharded directory tree.
//!
//! Stores are plain persistence: they do not validate, assign identifiers or order results.
//! Those rules live in [`crate::service::RecordService`].

mod file;
mod memory;

pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;

use crate::record::EhrRecord;
use crate::RecordResult;
use ehr_uuid::RecordId;

/// Storage operations required by the record service.
///
/// Implementations must be safe to share between concurrently running requests; each
/// method is a single self-contained store call.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Persists a new record. The identifier is assumed to be fresh.
    fn insert(&self, record: &EhrRecord) -> RecordResult<()>;

    /// Returns every stored record, in no particular order.
    fn all(&self) -> RecordResult<Vec<EhrRecord>>;

    /// Looks a record up by identifier.
    fn get(&self, id: &RecordId) -> RecordResult<Option<EhrRecord>>;

    /// Returns the earliest-created record whose `patientId` equals `patient_id` exactly.
    fn find_by_patient_id(&self, patient_id: &str) -> RecordResult<Option<EhrRecord>> {
        Ok(earliest(
            self.all()?
                .into_iter()
                .filter(|r| r.patient_id.as_str() == patient_id),
        ))
    }

    /// Overwrites an existing record. Returns `false` when no record has that identifier.
    fn replace(&self, record: &EhrRecord) -> RecordResult<bool>;

    /// Removes a record. Returns the removed record, or `None` when it did not exist.
    fn remove(&self, id: &RecordId) -> RecordResult<Option<EhrRecord>>;
}

/// Earliest `created_at` wins; ties are broken by identifier.
pub(crate) fn earliest(records: impl Iterator<Item = EhrRecord>) -> Option<EhrRecord> {
    records.min_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}
