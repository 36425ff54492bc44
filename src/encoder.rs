//! Output encoding
//!
//! This module wraps assessments and programs in a versioned envelope with
//! producer metadata, so downstream consumers can tell which engine build
//! produced a record and when.

use crate::error::CoachError;
use crate::types::{AssessmentResult, Confidence, GenerationOutcome, TrainingProgram};
use crate::{CRUX_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current envelope schema version
pub const ENVELOPE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Headline figures for a program, for consumers that skip the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub weeks: usize,
    pub training_sessions: usize,
    pub high_intensity_sessions: usize,
    pub requires_coach_review: bool,
    pub confidence: Confidence,
    pub narrated: bool,
}

impl ProgramSummary {
    fn of(program: &TrainingProgram) -> Self {
        let sessions = || program.weeks.iter().flat_map(|w| w.sessions()).filter(|s| !s.is_rest());
        Self {
            weeks: program.weeks.len(),
            training_sessions: sessions().count(),
            high_intensity_sessions: sessions()
                .filter(|s| s.session_type.is_high_intensity())
                .count(),
            requires_coach_review: program.requires_coach_review,
            confidence: program.confidence,
            narrated: matches!(program.generation, GenerationOutcome::Narrated { .. }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEnvelope {
    pub schema_version: String,
    pub producer: Producer,
    pub computed_at_utc: String,
    pub summary: ProgramSummary,
    pub program: TrainingProgram,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentEnvelope {
    pub schema_version: String,
    pub producer: Producer,
    pub computed_at_utc: String,
    pub assessment: AssessmentResult,
}

/// Encoder for envelope JSON
pub struct ProgramEncoder {
    instance_id: String,
}

impl Default for ProgramEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramEncoder {
    /// Create an encoder with a random instance id
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn producer(&self) -> Producer {
        Producer {
            name: PRODUCER_NAME.to_string(),
            version: CRUX_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    pub fn encode_program(
        &self,
        program: &TrainingProgram,
        computed_at: DateTime<Utc>,
    ) -> ProgramEnvelope {
        ProgramEnvelope {
            schema_version: ENVELOPE_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: computed_at.to_rfc3339(),
            summary: ProgramSummary::of(program),
            program: program.clone(),
        }
    }

    pub fn encode_assessment(
        &self,
        assessment: &AssessmentResult,
        computed_at: DateTime<Utc>,
    ) -> AssessmentEnvelope {
        AssessmentEnvelope {
            schema_version: ENVELOPE_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: computed_at.to_rfc3339(),
            assessment: assessment.clone(),
        }
    }

    /// Encode a program envelope to pretty JSON
    pub fn encode_to_json(
        &self,
        program: &TrainingProgram,
        computed_at: DateTime<Utc>,
    ) -> Result<String, CoachError> {
        let envelope = self.encode_program(program, computed_at);
        serde_json::to_string_pretty(&envelope).map_err(CoachError::JsonError)
    }

    pub fn encode_assessment_to_json(
        &self,
        assessment: &AssessmentResult,
        computed_at: DateTime<Utc>,
    ) -> Result<String, CoachError> {
        let envelope = self.encode_assessment(assessment, computed_at);
        serde_json::to_string_pretty(&envelope).map_err(CoachError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::Grade;
    use crate::pipeline::{plan_program, score_assessment};
    use crate::types::{DetailedContext, ProgramType, RawMeasurement, UserPreferences, WEEKDAYS};
    use chrono::TimeZone;

    fn program() -> TrainingProgram {
        let assessment = score_assessment(&RawMeasurement {
            body_weight_kg: 62.0,
            height_cm: 168.0,
            added_weight_kg: 18.0,
            max_pull_ups: 18,
            max_push_ups: 30,
            max_toe_to_bar: 14,
            leg_spread_cm: 150.0,
            eighty_percent_grade: Grade::new(4),
        })
        .unwrap();
        let preferences = UserPreferences {
            available_days: WEEKDAYS.to_vec(),
            session_length_minutes: 75,
            equipment_access: Vec::new(),
            primary_goals: Vec::new(),
            injury_history: Vec::new(),
        };
        plan_program(
            &assessment,
            &preferences,
            ProgramType::Quick,
            &DetailedContext::default(),
            Utc.with_ymd_and_hms(2024, 2, 5, 6, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_program_envelope() {
        let encoder = ProgramEncoder::with_instance_id("test-instance");
        let computed_at = Utc.with_ymd_and_hms(2024, 2, 5, 6, 1, 0).unwrap();
        let envelope = encoder.encode_program(&program(), computed_at);

        assert_eq!(envelope.schema_version, ENVELOPE_VERSION);
        assert_eq!(envelope.producer.name, PRODUCER_NAME);
        assert_eq!(envelope.producer.instance_id, "test-instance");
        assert_eq!(envelope.computed_at_utc, "2024-02-05T06:01:00+00:00");
        assert_eq!(envelope.summary.weeks, 6);
        assert!(!envelope.summary.narrated);
        assert!(envelope.summary.high_intensity_sessions > 0);
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = ProgramEncoder::new();
        let json = encoder
            .encode_to_json(&program(), Utc.with_ymd_and_hms(2024, 2, 5, 6, 1, 0).unwrap())
            .unwrap();

        assert!(json.contains("\"schema_version\""));
        assert!(json.contains(PRODUCER_NAME));

        let parsed: ProgramEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.program.weeks.len(), 6);
    }
}
