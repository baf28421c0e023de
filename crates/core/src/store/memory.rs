use super::RecordStore;
use crate::record::EhrRecord;
use crate::{RecordError, RecordResult};
use ehr_uuid::RecordId;
use std::sync::RwLock;

/// Records held in process memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<EhrRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, record: &EhrRecord) -> RecordResult<()> {
        let mut records = self.records.write().map_err(|_| RecordError::LockPoisoned)?;
        records.push(record.clone());
        Ok(())
    }

    fn all(&self) -> RecordResult<Vec<EhrRecord>> {
        let records = self.records.read().map_err(|_| RecordError::LockPoisoned)?;
        Ok(records.clone())
    }

    fn get(&self, id: &RecordId) -> RecordResult<Option<EhrRecord>> {
        let records = self.records.read().map_err(|_| RecordError::LockPoisoned)?;
        Ok(records.iter().find(|r| &r.id == id).cloned())
    }

    fn find_by_patient_id(&self, patient_id: &str) -> RecordResult<Option<EhrRecord>> {
        let records = self.records.read().map_err(|_| RecordError::LockPoisoned)?;
        Ok(super::earliest(
            records
                .iter()
                .filter(|r| r.patient_id.as_str() == patient_id)
                .cloned(),
        ))
    }

    fn replace(&self, record: &EhrRecord) -> RecordResult<bool> {
        let mut records = self.records.write().map_err(|_| RecordError::LockPoisoned)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, id: &RecordId) -> RecordResult<Option<EhrRecord>> {
        let mut records = self.records.write().map_err(|_| RecordError::LockPoisoned)?;
        Ok(records
            .iter()
            .position(|r| &r.id == id)
            .map(|index| records.remove(index)))
    }
}
