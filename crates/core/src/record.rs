//! The EHR record document.
//!
//! A record couples the two required fields (`patientId`, `summary`) with optional clinical
//! content loosely aligned with FHIR resources (Patient, Encounter, Condition, Observation,
//! MedicationRequest, CarePlan). The wire form is camelCase JSON; the identifier travels as
//! `_id`.
//!
//! [`RecordDraft`] is the write-side shape used by create and update. It has no identifier or
//! creation timestamp: those are assigned by the service and never taken from callers.

use chrono::{DateTime, Utc};
use ehr_types::NonEmptyText;
use ehr_uuid::RecordId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored EHR record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EhrRecord {
    /// System-assigned identifier, immutable.
    #[serde(rename = "_id")]
    #[schema(value_type = String, example = "550e8400e29b41d4a716446655440000")]
    pub id: RecordId,

    #[schema(value_type = String, example = "P1001")]
    pub patient_id: NonEmptyText,

    #[schema(value_type = String, example = "Patient has fever and body pain.")]
    pub summary: NonEmptyText,

    #[serde(flatten)]
    pub content: ClinicalContent,

    /// Set once at creation and never updated.
    #[serde(with = "crate::dates::required")]
    pub created_at: DateTime<Utc>,
}

impl EhrRecord {
    /// First given name of the patient, if any.
    pub fn given_name(&self) -> Option<&str> {
        self.content
            .patient
            .name
            .given
            .first()
            .map(String::as_str)
    }

    /// Entity values tagged with `kind`, in record order.
    pub fn entities_of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.content
            .entities
            .iter()
            .filter(move |e| e.kind.as_deref() == Some(kind))
            .filter_map(|e| e.entity.as_deref())
    }
}

/// Create/update input.
///
/// Unknown keys, `_id` and `createdAt` are ignored on purpose: the identifier and timestamp
/// belong to the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "P1001")]
    pub patient_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Flu")]
    pub summary: Option<String>,

    #[serde(flatten)]
    pub content: ClinicalContent,
}

impl From<EhrRecord> for RecordDraft {
    fn from(record: EhrRecord) -> Self {
        Self {
            patient_id: Some(record.patient_id.into_inner()),
            summary: Some(record.summary.into_inner()),
            content: record.content,
        }
    }
}

/// Every optional part of a record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalContent {
    #[serde(default)]
    pub patient: PatientInfo,
    #[serde(default)]
    pub encounter: Encounter,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub care_plan: CarePlan,
    #[serde(default)]
    pub entities: Vec<ClinicalEntity>,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub past_history: Vec<String>,
    #[serde(
        default,
        with = "crate::dates::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default)]
    pub name: HumanName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(
        default,
        with = "crate::dates::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub telecom: Vec<ContactPoint>,
    #[serde(default)]
    pub address: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Phone number, email address or similar.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    #[serde(default)]
    pub line: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practitioner: Option<Practitioner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Practitioner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Period {
    #[serde(
        default,
        with = "crate::dates::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::dates::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<DateTime<Utc>>,
}

/// Condition or diagnosis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
    #[serde(
        default,
        with = "crate::dates::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub onset_date_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Medication request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub med_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(
        default,
        with = "crate::dates::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub authored_on: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Generic tag pair produced by entity extraction, e.g. `{entity: "fever", type: "Symptom"}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClinicalEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ClinicalEntity {
    pub fn new(entity: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            kind: Some(kind.into()),
        }
    }
}

/// Vital signs, stored verbatim as entered (e.g. `"101F"`, `"120/80"`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<String>,
}
