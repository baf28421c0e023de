//! JSON envelopes shared by every endpoint.

use ehr_core::EhrRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STORED_MESSAGE: &str = "EHR stored successfully";
pub const UPDATED_MESSAGE: &str = "EHR updated successfully";
pub const DELETED_MESSAGE: &str = "EHR deleted successfully";
pub const NOT_FOUND_MESSAGE: &str = "No record found";

/// Failure body: `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    #[schema(example = "Ehr validation failed: summary: Path `summary` is required.")]
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Informational body: `{"message": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    #[schema(example = "No record found")]
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Write confirmation carrying the affected record: `{"message": "...", "ehr": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EhrRes {
    #[schema(example = "EHR stored successfully")]
    pub message: String,
    pub ehr: EhrRecord,
}

impl EhrRes {
    pub fn stored(ehr: EhrRecord) -> Self {
        Self {
            message: STORED_MESSAGE.into(),
            ehr,
        }
    }

    pub fn updated(ehr: EhrRecord) -> Self {
        Self {
            message: UPDATED_MESSAGE.into(),
            ehr,
        }
    }

    pub fn deleted(ehr: EhrRecord) -> Self {
        Self {
            message: DELETED_MESSAGE.into(),
            ehr,
        }
    }
}
