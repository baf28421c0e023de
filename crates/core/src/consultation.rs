//! Live consultation workflow.
//!
//! A consultation records audio for a while, hands the capture to a [`ClinicalExtractor`]
//! and holds the structured [`Extraction`] it returns. Phase changes are published on a
//! `tokio::sync::watch` channel so a UI can follow along without polling.
//!
//! The extractor is a seam: [`SimulatedExtractor`] stands in for a real speech/NLP backend
//! and returns a fixed result after a processing delay.

use crate::constants::{MEDICATION_ENTITY_TYPE, SYMPTOM_ENTITY_TYPE};
use crate::record::{ClinicalEntity, Condition, HumanName, Medication, RecordDraft};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub const DEFAULT_RECORDING_DURATION: Duration = Duration::from_secs(8);
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("cannot {action} while consultation is {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },
    #[error("extraction failed: {0}")]
    Extraction(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Recording => "recording",
            Phase::Processing => "processing",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Raw audio handed to the extractor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioCapture {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl AudioCapture {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: Some(mime_type.into()),
        }
    }
}

/// Structured result of a consultation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub name: String,
    pub disease: String,
    pub symptoms: Vec<String>,
    pub medications: Vec<String>,
    pub notes: String,
}

impl Extraction {
    /// Converts the extraction into a record draft for `patient_id`.
    ///
    /// The notes become the summary. When the notes are blank the disease is used instead,
    /// so an extraction with either one produces a valid draft.
    pub fn into_draft(self, patient_id: impl Into<String>) -> RecordDraft {
        let mut draft = RecordDraft {
            patient_id: Some(patient_id.into()),
            ..Default::default()
        };

        let summary = if self.notes.trim().is_empty() {
            self.disease.clone()
        } else {
            self.notes
        };
        draft.summary = Some(summary);

        let mut words = self.name.split_whitespace();
        if let Some(given) = words.next() {
            draft.content.patient.name = HumanName {
                family: words.last().map(str::to_string),
                given: vec![given.to_string()],
                full_name: Some(self.name.trim().to_string()),
            };
        }

        if !self.disease.trim().is_empty() {
            draft.content.conditions.push(Condition {
                code: Some(self.disease),
                clinical_status: Some("active".into()),
                ..Default::default()
            });
        }

        let entities = &mut draft.content.entities;
        entities.extend(
            self.symptoms
                .iter()
                .map(|s| ClinicalEntity::new(s.as_str(), SYMPTOM_ENTITY_TYPE)),
        );
        entities.extend(
            self.medications
                .iter()
                .map(|m| ClinicalEntity::new(m.as_str(), MEDICATION_ENTITY_TYPE)),
        );

        draft.content.medications = self
            .medications
            .into_iter()
            .map(|name| Medication {
                name: Some(name),
                status: Some("active".into()),
                ..Default::default()
            })
            .collect();

        draft
    }
}

/// Turns captured audio into a structured extraction.
pub trait ClinicalExtractor: Send + Sync {
    fn extract(
        &self,
        audio: &AudioCapture,
    ) -> impl Future<Output = Result<Extraction, ConsultationError>> + Send;
}

/// Extractor that ignores the audio and returns a fixed result after `delay`.
#[derive(Clone, Debug)]
pub struct SimulatedExtractor {
    delay: Duration,
}

impl Default for SimulatedExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSING_DELAY)
    }
}

impl SimulatedExtractor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn sample() -> Extraction {
        Extraction {
            name: "John Smith".into(),
            disease: "Hypertension".into(),
            symptoms: vec!["Headaches".into(), "Dizziness".into()],
            medications: vec!["Lisinopril".into(), "HCTZ".into()],
            notes: "Patient shows signs of improved blood pressure after treatment.".into(),
        }
    }
}

impl ClinicalExtractor for SimulatedExtractor {
    async fn extract(&self, audio: &AudioCapture) -> Result<Extraction, ConsultationError> {
        tracing::debug!(
            bytes = audio.bytes.len(),
            delay = ?self.delay,
            "simulating extraction"
        );
        tokio::time::sleep(self.delay).await;
        Ok(Self::sample())
    }
}

/// A single consultation session driven through its phases.
#[derive(Debug)]
pub struct Consultation<E> {
    extractor: E,
    recording_duration: Duration,
    phase: watch::Sender<Phase>,
    started_at: Option<Instant>,
    recorded: Duration,
    result: Option<Extraction>,
}

impl<E: ClinicalExtractor> Consultation<E> {
    pub fn new(extractor: E) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            extractor,
            recording_duration: DEFAULT_RECORDING_DURATION,
            phase,
            started_at: None,
            recorded: Duration::ZERO,
            result: None,
        }
    }

    pub fn with_recording_duration(mut self, duration: Duration) -> Self {
        self.recording_duration = duration;
        self
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver that observes every phase change.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn result(&self) -> Option<&Extraction> {
        self.result.as_ref()
    }

    /// Time spent recording. Frozen once recording stops.
    pub fn elapsed(&self) -> Duration {
        match (self.phase(), self.started_at) {
            (Phase::Recording, Some(started)) => started.elapsed(),
            _ => self.recorded,
        }
    }

    /// Begins recording. Clears any earlier result.
    ///
    /// # Errors
    ///
    /// Returns `ConsultationError::InvalidTransition` while recording or processing.
    pub fn start(&mut self) -> Result<(), ConsultationError> {
        match self.phase() {
            Phase::Idle | Phase::Completed | Phase::Failed => {}
            phase => {
                return Err(ConsultationError::InvalidTransition {
                    phase,
                    action: "start recording",
                })
            }
        }
        self.result = None;
        self.recorded = Duration::ZERO;
        self.started_at = Some(Instant::now());
        self.set_phase(Phase::Recording);
        Ok(())
    }

    /// Stops recording and runs the extractor over `audio`.
    ///
    /// # Errors
    ///
    /// - `ConsultationError::InvalidTransition` unless currently recording
    /// - the extractor's error, after which the phase is `Failed`
    pub async fn stop(&mut self, audio: AudioCapture) -> Result<Extraction, ConsultationError> {
        if self.phase() != Phase::Recording {
            return Err(ConsultationError::InvalidTransition {
                phase: self.phase(),
                action: "stop recording",
            });
        }
        self.recorded = self.started_at.map(|s| s.elapsed()).unwrap_or_default();
        self.set_phase(Phase::Processing);

        match self.extractor.extract(&audio).await {
            Ok(extraction) => {
                self.result = Some(extraction.clone());
                self.set_phase(Phase::Completed);
                Ok(extraction)
            }
            Err(err) => {
                tracing::warn!(error = %err, "consultation extraction failed");
                self.set_phase(Phase::Failed);
                Err(err)
            }
        }
    }

    /// Records for the configured duration, then stops and extracts.
    pub async fn record(&mut self, audio: AudioCapture) -> Result<Extraction, ConsultationError> {
        self.start()?;
        tokio::time::sleep(self.recording_duration).await;
        self.stop(audio).await
    }

    /// Back to `Idle`, dropping any result.
    pub fn reset(&mut self) {
        self.result = None;
        self.started_at = None;
        self.recorded = Duration::ZERO;
        self.set_phase(Phase::Idle);
    }

    fn set_phase(&self, phase: Phase) {
        tracing::debug!(%phase, "consultation phase changed");
        self.phase.send_replace(phase);
    }
}

/// Renders seconds as `m:ss`.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingExtractor;

    impl ClinicalExtractor for FailingExtractor {
        async fn extract(&self, _audio: &AudioCapture) -> Result<Extraction, ConsultationError> {
            Err(ConsultationError::Extraction("backend unavailable".into()))
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(8), "0:08");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_runs_full_cycle() {
        let mut consultation = Consultation::new(SimulatedExtractor::default());
        let mut phases = consultation.subscribe();
        assert_eq!(*phases.borrow_and_update(), Phase::Idle);

        let extraction = consultation
            .record(AudioCapture::default())
            .await
            .expect("simulated extraction succeeds");

        assert_eq!(extraction, SimulatedExtractor::sample());
        assert_eq!(consultation.phase(), Phase::Completed);
        assert_eq!(consultation.result(), Some(&extraction));
        assert_eq!(consultation.elapsed(), DEFAULT_RECORDING_DURATION);
        assert!(phases.has_changed().unwrap());
        assert_eq!(*phases.borrow_and_update(), Phase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_ticks_while_recording() {
        let mut consultation = Consultation::new(SimulatedExtractor::default());
        consultation.start().unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(consultation.elapsed().as_secs(), 5);
        assert_eq!(format_elapsed(consultation.elapsed().as_secs()), "0:05");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_transitions() {
        let mut consultation = Consultation::new(SimulatedExtractor::default());

        let err = consultation.stop(AudioCapture::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ConsultationError::InvalidTransition { phase: Phase::Idle, .. }
        ));

        consultation.start().unwrap();
        let err = consultation.start().unwrap_err();
        assert!(matches!(
            err,
            ConsultationError::InvalidTransition { phase: Phase::Recording, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_clears_previous_result() {
        let mut consultation = Consultation::new(SimulatedExtractor::new(Duration::from_millis(10)))
            .with_recording_duration(Duration::from_secs(1));
        consultation.record(AudioCapture::default()).await.unwrap();
        assert!(consultation.result().is_some());

        consultation.start().unwrap();
        assert!(consultation.result().is_none());
        assert_eq!(consultation.phase(), Phase::Recording);

        consultation.reset();
        assert_eq!(consultation.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extractor_failure_moves_to_failed() {
        let mut consultation = Consultation::new(FailingExtractor);
        let err = consultation.record(AudioCapture::default()).await.unwrap_err();

        assert!(matches!(err, ConsultationError::Extraction(_)));
        assert_eq!(consultation.phase(), Phase::Failed);
        assert!(consultation.result().is_none());
        consultation.start().expect("can start again after failure");
    }

    #[test]
    fn test_into_draft_maps_extraction() {
        let draft = SimulatedExtractor::sample().into_draft("P1001");

        assert_eq!(draft.patient_id.as_deref(), Some("P1001"));
        assert_eq!(
            draft.summary.as_deref(),
            Some("Patient shows signs of improved blood pressure after treatment.")
        );
        assert_eq!(draft.content.patient.name.given, vec!["John"]);
        assert_eq!(draft.content.patient.name.family.as_deref(), Some("Smith"));
        assert_eq!(draft.content.conditions[0].code.as_deref(), Some("Hypertension"));
        assert_eq!(draft.content.entities.len(), 4);
        assert_eq!(draft.content.entities[0], ClinicalEntity::new("Headaches", "Symptom"));
        let meds: Vec<_> = draft
            .content
            .medications
            .iter()
            .filter_map(|m| m.name.as_deref())
            .collect();
        assert_eq!(meds, vec!["Lisinopril", "HCTZ"]);
    }

    #[test]
    fn test_into_draft_falls_back_to_disease_for_summary() {
        let extraction = Extraction {
            disease: "Flu".into(),
            ..Default::default()
        };
        let draft = extraction.into_draft("P2");
        assert_eq!(draft.summary.as_deref(), Some("Flu"));
        assert_eq!(draft.content.patient.name, HumanName::default());
    }
}
