//! # API Shared
//!
//! Shared utilities and definitions for the EHR APIs.
//!
//! Contains:
//! - Wire envelopes common to every endpoint (`wire` module)
//! - Shared services like `HealthService`
//! - The signed-in session as handed to clients
//!
//! Used by `api-rest` and `ehr-client` so both sides agree on the wire shape.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{Session, SessionUser, DOCTOR_ROLE};
pub use health::{HealthRes, HealthService};
pub use wire::{EhrRes, ErrorRes, MessageRes};
