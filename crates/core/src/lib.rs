//! # EHR Core
//!
//! Core business logic for the EHR record backend.
//!
//! This crate contains pure data operations and storage:
//! - The record document model and required-field validation
//! - Record stores: in-memory, and sharded JSON files under the data directory
//! - The record service (create, list, lookup, update, delete)
//! - FHIR bundle export and the consultation workflow
//!
//! **No API concerns**: HTTP servers, wire envelopes and sessions belong in `api-rest` or
//! `api-shared`.

pub mod bundle;
pub mod config;
pub mod constants;
pub mod consultation;
pub mod dates;
pub mod error;
pub mod record;
pub mod service;
pub mod store;
pub mod validation;

pub use bundle::fhir_bundle;
pub use config::{store_location_from_env_value, CoreConfig, StoreLocation};
pub use consultation::{
    format_elapsed, AudioCapture, ClinicalExtractor, Consultation, ConsultationError, Extraction,
    Phase, SimulatedExtractor,
};
pub use error::{ErrorKind, RecordError, RecordResult};
pub use record::{
    Address, CarePlan, ClinicalContent, ClinicalEntity, Coding, Condition, ContactPoint,
    EhrRecord, Encounter, Gender, HumanName, Medication, Observation, PatientInfo, Period,
    Practitioner, RecordDraft, Vitals,
};
pub use service::RecordService;
pub use store::{FileRecordStore, InMemoryRecordStore, RecordStore};

pub use ehr_types::NonEmptyText;
pub use ehr_uuid::RecordId;
