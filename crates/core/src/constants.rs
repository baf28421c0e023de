//! Constants used throughout the EHR core crate.
//!
//! Path and filename constants live here so the stores and the configuration agree on the
//! on-disk layout.

/// Directory (under the data directory) holding one sharded folder per record.
pub const RECORDS_DIR_NAME: &str = "records";

/// Default data directory when no store location is configured.
pub const DEFAULT_DATA_DIR: &str = "ehr_data";

/// Filename of the JSON document inside a record folder.
pub const RECORD_JSON_FILENAME: &str = "record.json";

/// Suffix for the temporary file written before the atomic rename.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Store location value selecting the in-memory store.
pub const MEMORY_STORE_URL: &str = "memory://";

/// Prefix accepted in front of a file store directory.
pub const FILE_STORE_SCHEME: &str = "file://";

/// Document model name; appears in validation messages.
pub const RECORD_MODEL_NAME: &str = "Ehr";

/// Entity type tag marking a symptom in `entities`.
pub const SYMPTOM_ENTITY_TYPE: &str = "Symptom";

/// Entity type tag marking a medication in `entities`.
pub const MEDICATION_ENTITY_TYPE: &str = "Medication";
