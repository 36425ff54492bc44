//! Narration boundary
//!
//! The program structure is final before this module runs. A
//! `NarrationProvider` is only asked for descriptive text, which is parsed as a
//! narration document and attached to sessions that already exist. Nothing in
//! the document can add, remove or reschedule a session.
//!
//! Any failure (timeout, provider error, malformed document) discards the
//! narration and marks the program for coach review with low confidence.

use crate::error::CoachError;
use crate::types::{
    AssessmentResult, Confidence, DetailedContext, GenerationOutcome, ReviewReason,
    TrainingProgram, PROGRAM_WEEKS,
};
use async_trait::async_trait;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default narration timeout
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(45);

/// Input handed to a narration provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub program_id: String,
    pub prompt: String,
}

impl NarrationRequest {
    /// Build the prompt from a fixed program
    pub fn for_program(
        program: &TrainingProgram,
        assessment: &AssessmentResult,
        context: &DetailedContext,
    ) -> Self {
        Self {
            program_id: program.id.to_string(),
            prompt: build_prompt(program, assessment, context),
        }
    }
}

/// Source of descriptive text for a finished program
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Provider identifier recorded on the program
    fn name(&self) -> &'static str;

    /// Return a narration document as free text
    async fn narrate(&self, request: &NarrationRequest) -> Result<String, CoachError>;
}

/// Narration for one session day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNarration {
    pub day: Weekday,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekNarration {
    pub week: u8,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sessions: Vec<SessionNarration>,
}

/// Expected shape of provider output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationDocument {
    pub weeks: Vec<WeekNarration>,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl NarrationDocument {
    /// Parse provider text. The document must cover weeks 1-6 in order.
    pub fn parse(text: &str) -> Result<Self, CoachError> {
        let document: NarrationDocument = serde_json::from_str(text.trim())
            .map_err(|e| CoachError::GenerationParseError(e.to_string()))?;

        if document.weeks.len() != PROGRAM_WEEKS {
            return Err(CoachError::GenerationParseError(format!(
                "expected {PROGRAM_WEEKS} weeks, found {}",
                document.weeks.len()
            )));
        }
        for (index, week) in document.weeks.iter().enumerate() {
            if usize::from(week.week) != index + 1 {
                return Err(CoachError::GenerationParseError(format!(
                    "week {} out of order at position {}",
                    week.week,
                    index + 1
                )));
            }
        }

        Ok(document)
    }

    /// Copy narration strings onto matching active sessions
    pub fn attach_to(&self, program: &mut TrainingProgram) {
        for (narration, week) in self.weeks.iter().zip(program.weeks.iter_mut()) {
            if let Some(summary) = narration.summary.as_deref().filter(|s| !s.trim().is_empty()) {
                program
                    .ai_insights
                    .push(format!("Week {}: {}", week.number, summary.trim()));
            }

            for entry in &narration.sessions {
                let session = week
                    .days
                    .iter_mut()
                    .filter(|d| d.weekday == entry.day)
                    .flat_map(|d| d.sessions.iter_mut())
                    .find(|s| !s.is_rest());
                // Text for a rest day has nowhere to go
                if let Some(session) = session {
                    session.narration = Some(entry.text.trim().to_string());
                }
            }
        }

        program.ai_insights.extend(
            self.insights
                .iter()
                .map(|i| i.trim())
                .filter(|i| !i.is_empty())
                .map(String::from),
        );
    }
}

/// Timeout-bounded call into a narration provider
#[derive(Clone)]
pub struct GenerationBoundary {
    provider: Arc<dyn NarrationProvider>,
    timeout: Duration,
}

impl GenerationBoundary {
    pub fn new(provider: Arc<dyn NarrationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch and validate a narration document
    pub async fn request(&self, request: &NarrationRequest) -> Result<NarrationDocument, CoachError> {
        let text = tokio::time::timeout(self.timeout, self.provider.narrate(request))
            .await
            .map_err(|_| CoachError::GenerationTimeoutError(self.timeout))??;
        NarrationDocument::parse(&text)
    }

    /// Narrate a program, falling back to the bare structure on any failure.
    /// Never fails.
    pub async fn enrich(
        &self,
        mut program: TrainingProgram,
        request: &NarrationRequest,
    ) -> TrainingProgram {
        match self.request(request).await {
            Ok(document) => {
                document.attach_to(&mut program);
                program.generation = GenerationOutcome::Narrated {
                    provider: self.provider.name().to_string(),
                };
                info!(
                    program_id = %program.id,
                    provider = self.provider.name(),
                    "attached narration"
                );
            }
            Err(error) => apply_fallback(&mut program, &error),
        }
        program
    }
}

/// Keep the planned structure, force review and low confidence
pub fn apply_fallback(program: &mut TrainingProgram, error: &CoachError) {
    warn!(program_id = %program.id, error = %error, "narration discarded, emitting planned program");

    program.requires_coach_review = true;
    if !program.review_reasons.contains(&ReviewReason::NarrationFallback) {
        program.review_reasons.push(ReviewReason::NarrationFallback);
    }
    program.confidence = Confidence::Low;
    program.generation = GenerationOutcome::Fallback {
        reason: error.to_string(),
    };
}

/// Provider that replays fixed text
pub struct StaticNarrator {
    text: String,
}

impl StaticNarrator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl NarrationProvider for StaticNarrator {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn narrate(&self, _request: &NarrationRequest) -> Result<String, CoachError> {
        Ok(self.text.clone())
    }
}

fn build_prompt(
    program: &TrainingProgram,
    assessment: &AssessmentResult,
    context: &DetailedContext,
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Write coaching narration for a fixed {}-week bouldering program ({}).",
        program.weeks.len(),
        program.program_type.as_str()
    );
    let _ = writeln!(
        prompt,
        "Climber: predicted {}, composite {:.2}, strongest {}, weakest {}.",
        assessment.predicted_grade,
        assessment.composite_score,
        assessment.strongest_area.as_str(),
        assessment.weakest_area.as_str()
    );
    if let Some(years) = context.climbing_years {
        let _ = writeln!(prompt, "Climbing for {years} years.");
    }
    if let Some(style) = &context.preferred_style {
        let _ = writeln!(prompt, "Preferred style: {style}.");
    }
    if let Some(recent) = &context.recent_performance {
        let _ = writeln!(prompt, "Recent performance: {recent}.");
    }
    if let Some(notes) = &context.notes {
        let _ = writeln!(prompt, "Notes: {notes}.");
    }

    prompt.push_str("\nSchedule (do not change it):\n");
    for week in &program.weeks {
        let _ = writeln!(prompt, "Week {} ({:?}):", week.number, week.phase);
        for day in &week.days {
            if let Some(session) = day.active_session() {
                let _ = writeln!(
                    prompt,
                    "  {}: {} ({}, intensity {:.2}, volume {})",
                    day.label,
                    session.name,
                    session.session_type.as_str(),
                    session.target_intensity,
                    session.volume
                );
            }
        }
    }

    prompt.push_str(
        "\nReply with JSON only: {\"weeks\": [{\"week\": 1, \"summary\": \"...\", \
         \"sessions\": [{\"day\": \"Mon\", \"text\": \"...\"}]}, ...], \"insights\": [\"...\"]} \
         covering weeks 1 to 6 in order.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentScorer;
    use crate::grades::Grade;
    use crate::pipeline::plan_program;
    use crate::types::{ProgramType, RawMeasurement, UserPreferences};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    struct FailingNarrator;

    #[async_trait]
    impl NarrationProvider for FailingNarrator {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn narrate(&self, _request: &NarrationRequest) -> Result<String, CoachError> {
            Err(CoachError::GenerationError("upstream 503".to_string()))
        }
    }

    struct SlowNarrator;

    #[async_trait]
    impl NarrationProvider for SlowNarrator {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn narrate(&self, _request: &NarrationRequest) -> Result<String, CoachError> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(valid_document())
        }
    }

    fn assessment() -> AssessmentResult {
        let measurement = RawMeasurement {
            body_weight_kg: 70.0,
            height_cm: 178.0,
            added_weight_kg: 25.0,
            max_pull_ups: 15,
            max_push_ups: 30,
            max_toe_to_bar: 12,
            leg_spread_cm: 160.0,
            eighty_percent_grade: Grade::new(5),
        };
        AssessmentScorer::default()
            .score(&measurement, Utc.with_ymd_and_hms(2024, 6, 3, 7, 0, 0).unwrap())
            .unwrap()
    }

    fn planned() -> (AssessmentResult, TrainingProgram) {
        let assessment = assessment();
        let preferences = UserPreferences {
            available_days: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri, Weekday::Sat],
            session_length_minutes: 90,
            equipment_access: Vec::new(),
            primary_goals: Vec::new(),
            injury_history: Vec::new(),
        };
        let program = plan_program(
            &assessment,
            &preferences,
            ProgramType::Enhanced,
            &DetailedContext::default(),
            Utc.with_ymd_and_hms(2024, 6, 3, 7, 5, 0).unwrap(),
        )
        .unwrap();
        (assessment, program)
    }

    fn valid_document() -> String {
        let weeks: Vec<String> = (1..=6)
            .map(|w| {
                format!(
                    r#"{{"week": {w}, "summary": "Week {w} focus", "sessions": [{{"day": "Mon", "text": "Monday of week {w}"}}]}}"#
                )
            })
            .collect();
        format!(r#"{{"weeks": [{}], "insights": ["Sleep well"]}}"#, weeks.join(","))
    }

    fn boundary(provider: impl NarrationProvider + 'static) -> GenerationBoundary {
        GenerationBoundary::new(Arc::new(provider), DEFAULT_GENERATION_TIMEOUT)
    }

    #[test]
    fn test_parse_rejects_wrong_week_count() {
        let err = NarrationDocument::parse(r#"{"weeks": [{"week": 1}]}"#).unwrap_err();
        assert!(matches!(err, CoachError::GenerationParseError(_)));
    }

    #[test]
    fn test_parse_rejects_out_of_order_weeks() {
        let text = r#"{"weeks": [{"week": 2}, {"week": 1}, {"week": 3}, {"week": 4}, {"week": 5}, {"week": 6}]}"#;
        assert!(NarrationDocument::parse(text).is_err());
    }

    #[test]
    fn test_prompt_lists_fixed_sessions() {
        let (assessment, program) = planned();
        let request =
            NarrationRequest::for_program(&program, &assessment, &DetailedContext::default());
        assert!(request.prompt.contains("Week 6 (Assessment):"));
        assert!(request.prompt.contains("Monday: Max hangs"));
    }

    #[tokio::test]
    async fn test_non_json_reply_falls_back_to_planned_structure() {
        let (assessment, program) = planned();
        let request =
            NarrationRequest::for_program(&program, &assessment, &DetailedContext::default());

        let result = boundary(StaticNarrator::new("Here is your plan! Week 1: hang hard."))
            .enrich(program.clone(), &request)
            .await;

        assert_eq!(result.weeks, program.weeks);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.requires_coach_review);
        assert!(result.review_reasons.contains(&ReviewReason::NarrationFallback));
        assert!(matches!(result.generation, GenerationOutcome::Fallback { .. }));
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let (assessment, program) = planned();
        let request =
            NarrationRequest::for_program(&program, &assessment, &DetailedContext::default());

        let result = boundary(FailingNarrator).enrich(program.clone(), &request).await;
        assert_eq!(result.weeks, program.weeks);
        assert_eq!(
            result.generation,
            GenerationOutcome::Fallback {
                reason: "Narration provider failed: upstream 503".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let (assessment, program) = planned();
        let request =
            NarrationRequest::for_program(&program, &assessment, &DetailedContext::default());

        let err = boundary(SlowNarrator).request(&request).await.unwrap_err();
        assert!(matches!(err, CoachError::GenerationTimeoutError(d) if d == DEFAULT_GENERATION_TIMEOUT));

        let result = boundary(SlowNarrator).enrich(program.clone(), &request).await;
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.weeks, program.weeks);
    }

    #[tokio::test]
    async fn test_valid_narration_only_adds_text() {
        let (assessment, program) = planned();
        let request =
            NarrationRequest::for_program(&program, &assessment, &DetailedContext::default());

        let result = boundary(StaticNarrator::new(valid_document()))
            .enrich(program.clone(), &request)
            .await;

        assert_eq!(
            result.generation,
            GenerationOutcome::Narrated {
                provider: "static".to_string()
            }
        );
        assert_eq!(result.confidence, program.confidence);
        assert_eq!(
            result.weeks[0].days[0].sessions[0].narration.as_deref(),
            Some("Monday of week 1")
        );
        assert!(result.ai_insights.contains(&"Sleep well".to_string()));

        // Clearing narration recovers the planned structure
        let mut stripped = result.weeks.clone();
        for session in stripped
            .iter_mut()
            .flat_map(|w| w.days.iter_mut())
            .flat_map(|d| d.sessions.iter_mut())
        {
            session.narration = None;
        }
        assert_eq!(stripped, program.weeks);
    }
}
