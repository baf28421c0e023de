//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services, so that
//! request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_DATA_DIR, FILE_STORE_SCHEME, MEMORY_STORE_URL};
use crate::store::{FileRecordStore, InMemoryRecordStore, RecordStore};
use crate::{RecordError, RecordResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where records are persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    /// Process memory; contents are lost on exit.
    Memory,
    /// A directory holding the file store.
    Directory(PathBuf),
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store: StoreLocation,
}

impl CoreConfig {
    pub fn new(store: StoreLocation) -> Self {
        Self { store }
    }

    pub fn store_location(&self) -> &StoreLocation {
        &self.store
    }

    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::StorageDirCreation` if the file store directory cannot be
    /// created.
    pub fn open_store(&self) -> RecordResult<Arc<dyn RecordStore>> {
        match &self.store {
            StoreLocation::Memory => Ok(Arc::new(InMemoryRecordStore::new())),
            StoreLocation::Directory(dir) => Ok(Arc::new(FileRecordStore::open(dir)?)),
        }
    }
}

/// Parse the store location from an optional connection string.
///
/// - `None` or blank: the default `ehr_data` directory.
/// - `memory://`: the in-memory store.
/// - `file://<dir>` or a bare path: the file store rooted at that directory.
///
/// # Errors
///
/// Returns `RecordError::InvalidConfig` for `file://` with no path or for an unsupported
/// URL scheme.
pub fn store_location_from_env_value(value: Option<String>) -> RecordResult<StoreLocation> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(StoreLocation::Directory(PathBuf::from(DEFAULT_DATA_DIR)));
    };

    if value == MEMORY_STORE_URL {
        return Ok(StoreLocation::Memory);
    }

    if let Some(dir) = value.strip_prefix(FILE_STORE_SCHEME) {
        if dir.is_empty() {
            return Err(RecordError::InvalidConfig(
                "file:// store location needs a directory".into(),
            ));
        }
        return Ok(StoreLocation::Directory(PathBuf::from(dir)));
    }

    if let Some((scheme, _)) = value.split_once("://") {
        return Err(RecordError::InvalidConfig(format!(
            "unsupported store scheme '{scheme}' (expected memory:// or file://)"
        )));
    }

    Ok(StoreLocation::Directory(Path::new(&value).to_path_buf()))
}
