//! Record identifier and sharded-path utilities.
//!
//! Every EHR record is addressed by a [`RecordId`]: a version 4 UUID held in a *canonical*
//! representation of **32 lowercase hexadecimal characters** (no hyphens), for example
//! `550e8400e29b41d4a716446655440000`.
//!
//! The canonical form is what the API returns as `_id`, what clients send back on the
//! detail/edit/delete routes, and what the file store uses to derive a record's directory:
//!
//! ```text
//! <records_dir>/<id[0..2]>/<id[2..4]>/<id>/
//! ```
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected by
//! [`RecordId::parse`].

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
