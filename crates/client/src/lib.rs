//! # EHR Client
//!
//! Typed access to the EHR REST API plus the pure helpers the record views need.
//!
//! Every call is a single request with no retry and no cache. A [`Session`] attached with
//! [`EhrClient::with_session`] is sent as a bearer token on every request.
//!
//! [`Session`]: api_shared::Session

mod client;
mod error;
pub mod view;

pub use client::EhrClient;
pub use error::{ClientError, ClientResult, FALLBACK_MESSAGE};
pub use view::{filter_records, symptom_entities, RecordRow};
