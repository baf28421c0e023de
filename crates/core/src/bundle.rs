//! FHIR `collection` Bundle export for a stored record.
//!
//! The bundle is a read-only projection: nothing here is stored, and the record is the
//! source of truth. Timestamps without a value of their own fall back to the record's
//! `created_at` so repeated exports of the same record are identical.

use crate::constants::SYMPTOM_ENTITY_TYPE;
use crate::dates;
use crate::record::EhrRecord;
use serde_json::{json, Map, Value};

/// Builds the Bundle for `record`.
///
/// Entries appear in this order: `Patient`, `Practitioner` (only when the encounter names
/// one), one `Condition` per condition, one `Observation` per observation and per symptom
/// entity, then one `MedicationRequest` per medication.
pub fn fhir_bundle(record: &EhrRecord) -> Value {
    let recorded = dates::format(&record.created_at);
    let patient_ref = format!("Patient/{}", record.patient_id);

    let mut entries = vec![patient_resource(record)];

    if let Some(practitioner) = &record.content.encounter.practitioner {
        let mut resource = Map::new();
        resource.insert("resourceType".into(), json!("Practitioner"));
        insert_opt(&mut resource, "id", practitioner.id.as_deref());
        if let Some(name) = &practitioner.name {
            resource.insert("name".into(), json!([{ "text": name }]));
        }
        if let Some(qualification) = &practitioner.qualification {
            resource.insert(
                "qualification".into(),
                json!([{ "code": { "text": qualification } }]),
            );
        }
        entries.push(Value::Object(resource));
    }

    for condition in &record.content.conditions {
        let mut resource = Map::new();
        resource.insert("resourceType".into(), json!("Condition"));
        insert_opt(&mut resource, "id", condition.condition_id.as_deref());
        resource.insert("subject".into(), json!({ "reference": patient_ref }));
        if let Some(code) = &condition.code {
            resource.insert("code".into(), json!({ "text": code }));
        }
        if let Some(status) = &condition.clinical_status {
            resource.insert("clinicalStatus".into(), json!({ "text": status }));
        }
        if let Some(status) = &condition.verification_status {
            resource.insert("verificationStatus".into(), json!({ "text": status }));
        }
        if let Some(onset) = &condition.onset_date_time {
            resource.insert("onsetDateTime".into(), json!(dates::format(onset)));
        }
        resource.insert("recordedDate".into(), json!(recorded));
        entries.push(Value::Object(resource));
    }

    for observation in &record.content.observations {
        let mut resource = Map::new();
        resource.insert("resourceType".into(), json!("Observation"));
        insert_opt(&mut resource, "id", observation.observation_id.as_deref());
        insert_opt(&mut resource, "status", observation.status.as_deref());
        resource.insert("subject".into(), json!({ "reference": patient_ref }));
        if let Some(code) = &observation.code {
            resource.insert("code".into(), json!({ "text": code }));
        }
        insert_opt(&mut resource, "valueString", observation.value_string.as_deref());
        resource.insert("effectiveDateTime".into(), json!(recorded));
        entries.push(Value::Object(resource));
    }

    for symptom in record.entities_of_type(SYMPTOM_ENTITY_TYPE) {
        if symptom.trim().is_empty() {
            continue;
        }
        entries.push(json!({
            "resourceType": "Observation",
            "subject": { "reference": patient_ref },
            "code": { "text": symptom },
            "effectiveDateTime": recorded,
        }));
    }

    for medication in &record.content.medications {
        let mut resource = Map::new();
        resource.insert("resourceType".into(), json!("MedicationRequest"));
        insert_opt(&mut resource, "id", medication.med_id.as_deref());
        resource.insert(
            "status".into(),
            json!(medication.status.as_deref().unwrap_or("active")),
        );
        resource.insert("intent".into(), json!("order"));
        resource.insert("subject".into(), json!({ "reference": patient_ref }));
        if let Some(name) = &medication.name {
            resource.insert("medicationCodeableConcept".into(), json!({ "text": name }));
        }
        let dosage_text = [
            medication.dosage.as_deref(),
            medication.frequency.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
        if !dosage_text.is_empty() || medication.route.is_some() {
            let mut dosage = Map::new();
            if !dosage_text.is_empty() {
                dosage.insert("text".into(), json!(dosage_text));
            }
            if let Some(route) = &medication.route {
                dosage.insert("route".into(), json!({ "text": route }));
            }
            resource.insert("dosageInstruction".into(), json!([dosage]));
        }
        let authored = medication
            .authored_on
            .as_ref()
            .map(dates::format)
            .unwrap_or_else(|| recorded.clone());
        resource.insert("authoredOn".into(), json!(authored));
        entries.push(Value::Object(resource));
    }

    json!({
        "resourceType": "Bundle",
        "type": "collection",
        "timestamp": recorded,
        "entry": entries
            .into_iter()
            .map(|resource| json!({ "resource": resource }))
            .collect::<Vec<_>>(),
    })
}

fn patient_resource(record: &EhrRecord) -> Value {
    let patient = &record.content.patient;
    let mut resource = Map::new();
    resource.insert("resourceType".into(), json!("Patient"));
    resource.insert("id".into(), json!(record.patient_id.as_str()));

    let name = &patient.name;
    if name.family.is_some() || !name.given.is_empty() || name.full_name.is_some() {
        let mut entry = Map::new();
        insert_opt(&mut entry, "text", name.full_name.as_deref());
        insert_opt(&mut entry, "family", name.family.as_deref());
        if !name.given.is_empty() {
            entry.insert("given".into(), json!(name.given));
        }
        resource.insert("name".into(), json!([entry]));
    }
    if let Some(gender) = patient.gender {
        resource.insert("gender".into(), json!(gender.as_str()));
    }
    if let Some(birth_date) = &patient.birth_date {
        resource.insert(
            "birthDate".into(),
            json!(birth_date.format("%Y-%m-%d").to_string()),
        );
    }
    Value::Object(resource)
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), json!(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{
        ClinicalContent, ClinicalEntity, Condition, Encounter, Gender, HumanName, Medication,
        PatientInfo, Practitioner,
    };
    use chrono::{TimeZone, Utc};
    use ehr_types::NonEmptyText;
    use ehr_uuid::RecordId;

    fn record(content: ClinicalContent) -> EhrRecord {
        EhrRecord {
            id: RecordId::new(),
            patient_id: NonEmptyText::new("P1001").unwrap(),
            summary: NonEmptyText::new("Hypertension review").unwrap(),
            content,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    fn resource_types(bundle: &Value) -> Vec<&str> {
        bundle["entry"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["resource"]["resourceType"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn minimal_record_yields_patient_only() {
        let bundle = fhir_bundle(&record(ClinicalContent::default()));

        assert_eq!(bundle["resourceType"], "Bundle");
        assert_eq!(bundle["type"], "collection");
        assert_eq!(resource_types(&bundle), vec!["Patient"]);
        assert_eq!(bundle["entry"][0]["resource"]["id"], "P1001");
        assert!(bundle["entry"][0]["resource"].get("name").is_none());
    }

    #[test]
    fn full_record_maps_each_part() {
        let content = ClinicalContent {
            patient: PatientInfo {
                name: HumanName {
                    family: Some("Smith".into()),
                    given: vec!["John".into()],
                    full_name: Some("John Smith".into()),
                },
                gender: Some(Gender::Male),
                birth_date: Some(Utc.with_ymd_and_hms(1980, 5, 17, 0, 0, 0).unwrap()),
                ..Default::default()
            },
            encounter: Encounter {
                practitioner: Some(Practitioner {
                    id: Some("doctor-1".into()),
                    name: Some("Dr. Rao".into()),
                    qualification: None,
                }),
                ..Default::default()
            },
            conditions: vec![Condition {
                code: Some("Hypertension".into()),
                clinical_status: Some("active".into()),
                ..Default::default()
            }],
            entities: vec![
                ClinicalEntity::new("Headaches", "Symptom"),
                ClinicalEntity::new("Lisinopril", "Medication"),
                ClinicalEntity::new("Dizziness", "Symptom"),
            ],
            medications: vec![Medication {
                name: Some("Lisinopril".into()),
                dosage: Some("10mg".into()),
                frequency: Some("daily".into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let bundle = fhir_bundle(&record(content));

        assert_eq!(
            resource_types(&bundle),
            vec![
                "Patient",
                "Practitioner",
                "Condition",
                "Observation",
                "Observation",
                "MedicationRequest"
            ]
        );

        let patient = &bundle["entry"][0]["resource"];
        assert_eq!(patient["gender"], "male");
        assert_eq!(patient["birthDate"], "1980-05-17");
        assert_eq!(patient["name"][0]["given"][0], "John");

        assert_eq!(bundle["entry"][2]["resource"]["code"]["text"], "Hypertension");
        assert_eq!(bundle["entry"][3]["resource"]["code"]["text"], "Headaches");
        assert_eq!(bundle["entry"][4]["resource"]["code"]["text"], "Dizziness");

        let request = &bundle["entry"][5]["resource"];
        assert_eq!(request["medicationCodeableConcept"]["text"], "Lisinopril");
        assert_eq!(request["dosageInstruction"][0]["text"], "10mg daily");
        assert_eq!(request["subject"]["reference"], "Patient/P1001");
    }

    #[test]
    fn export_is_deterministic() {
        let rec = record(ClinicalContent {
            entities: vec![ClinicalEntity::new("fever", "Symptom")],
            ..Default::default()
        });

        assert_eq!(fhir_bundle(&rec), fhir_bundle(&rec));
        assert_eq!(fhir_bundle(&rec)["timestamp"], "2024-03-01T09:30:00.000Z");
    }
}
