//! File-backed record store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   records/
//!     <s1>/
//!       <s2>/
//!         <id>/
//!           record.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record identifier.
//!
//! Writes go to `record.json.tmp` and are renamed into place, so readers never observe a
//! half-written document. Within a process, an `RwLock` serialises writers against readers;
//! the last completed write wins.

use super::RecordStore;
use crate::constants::{RECORDS_DIR_NAME, RECORD_JSON_FILENAME, TEMP_FILE_SUFFIX};
use crate::record::EhrRecord;
use crate::{RecordError, RecordResult};
use ehr_uuid::RecordId;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug)]
pub struct FileRecordStore {
    records_dir: PathBuf,
    lock: RwLock<()>,
}

impl FileRecordStore {
    /// Opens (creating if needed) a store rooted at `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::StorageDirCreation` if the records directory cannot be created.
    pub fn open(data_dir: &Path) -> RecordResult<Self> {
        let records_dir = data_dir.join(RECORDS_DIR_NAME);
        fs::create_dir_all(&records_dir).map_err(RecordError::StorageDirCreation)?;
        Ok(Self {
            records_dir,
            lock: RwLock::new(()),
        })
    }

    pub fn records_dir(&self) -> &Path {
        &self.records_dir
    }

    fn record_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.records_dir).join(RECORD_JSON_FILENAME)
    }

    fn write_record(&self, record: &EhrRecord) -> RecordResult<()> {
        let path = self.record_path(&record.id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(RecordError::StorageDirCreation)?;
        }

        let json = serde_json::to_string_pretty(record).map_err(RecordError::Serialization)?;
        let tmp = path.with_file_name(format!("{RECORD_JSON_FILENAME}{TEMP_FILE_SUFFIX}"));
        fs::write(&tmp, json).map_err(RecordError::FileWrite)?;
        fs::rename(&tmp, &path).map_err(RecordError::FileWrite)
    }

    fn read_record(path: &Path) -> RecordResult<EhrRecord> {
        let contents = fs::read_to_string(path).map_err(RecordError::FileRead)?;
        parse_record(&contents)
            .map_err(|e| RecordError::Deserialization(format!("{}: {e}", path.display())))
    }

    /// Paths of every `record.json` below the shard tree.
    ///
    /// An unreadable records directory is an error. Unreadable shard folders below it are
    /// skipped with a warning.
    fn record_files(&self) -> RecordResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        let s1_iter = fs::read_dir(&self.records_dir).map_err(RecordError::FileRead)?;
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(e) => {
                    tracing::warn!("skipping unreadable shard {}: {}", s1_path.display(), e);
                    continue;
                }
            };
            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(e) => {
                        tracing::warn!("skipping unreadable shard {}: {}", s2_path.display(), e);
                        continue;
                    }
                };
                for id_ent in id_iter.flatten() {
                    let record_path = id_ent.path().join(RECORD_JSON_FILENAME);
                    if record_path.is_file() {
                        files.push(record_path);
                    }
                }
            }
        }

        Ok(files)
    }
}

/// Parses a stored document, reporting the JSON path of the first mismatch.
fn parse_record(contents: &str) -> Result<EhrRecord, String> {
    let mut deserializer = serde_json::Deserializer::from_str(contents);
    serde_path_to_error::deserialize::<_, EhrRecord>(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        format!("record schema mismatch at {path}: {source}")
    })
}

impl RecordStore for FileRecordStore {
    fn insert(&self, record: &EhrRecord) -> RecordResult<()> {
        let _guard = self.lock.write().map_err(|_| RecordError::LockPoisoned)?;
        self.write_record(record)
    }

    fn all(&self) -> RecordResult<Vec<EhrRecord>> {
        let _guard = self.lock.read().map_err(|_| RecordError::LockPoisoned)?;

        let mut records = Vec::new();
        for path in self.record_files()? {
            match Self::read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("skipping unreadable record {}: {}", path.display(), e);
                }
            }
        }
        Ok(records)
    }

    fn get(&self, id: &RecordId) -> RecordResult<Option<EhrRecord>> {
        let _guard = self.lock.read().map_err(|_| RecordError::LockPoisoned)?;

        let path = self.record_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn replace(&self, record: &EhrRecord) -> RecordResult<bool> {
        let _guard = self.lock.write().map_err(|_| RecordError::LockPoisoned)?;

        if !self.record_path(&record.id).is_file() {
            return Ok(false);
        }
        self.write_record(record)?;
        Ok(true)
    }

    fn remove(&self, id: &RecordId) -> RecordResult<Option<EhrRecord>> {
        let _guard = self.lock.write().map_err(|_| RecordError::LockPoisoned)?;

        let path = self.record_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        let record = match Self::read_record(&path) {
            Ok(record) => Some(record),
            Err(RecordError::Deserialization(e)) => {
                tracing::warn!("removing unreadable record {}: {}", path.display(), e);
                None
            }
            Err(e) => return Err(e),
        };
        fs::remove_dir_all(id.sharded_dir(&self.records_dir)).map_err(RecordError::FileRemove)?;
        Ok(record)
    }
}
