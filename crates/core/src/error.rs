/// Coarse classification of a [`RecordError`], following the service's error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was missing or blank.
    Validation,
    /// No record matched the identifier or patient id.
    NotFound,
    /// The underlying persistence layer failed.
    Store,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{0}")]
    Validation(String),
    #[error("no record found for {0}")]
    NotFound(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove record: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(String),
    #[error("record store lock poisoned")]
    LockPoisoned,
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::Validation(_) => ErrorKind::Validation,
            RecordError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Store,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
