//! Pipeline orchestration
//!
//! This module provides the public API for Crux. It runs the full flow from
//! raw measurements to a finished program:
//!
//! 1. AssessmentScorer - measurements to composite score and predicted grade
//! 2. PeriodizationPlanner - six-week calendar, validated placement by placement
//! 3. Plan adapters - injury and equipment rewrites
//! 4. ReviewGate - coach review and confidence
//! 5. GenerationBoundary - optional narration, with fallback

use crate::adapters::adapt_program;
use crate::assessment::AssessmentScorer;
use crate::clock::{Clock, SystemClock};
use crate::config::CoachConfig;
use crate::constraints::{validate_program, ConstraintValidator, Violation};
use crate::error::CoachError;
use crate::generation::{GenerationBoundary, NarrationProvider, NarrationRequest};
use crate::grades::GradeThresholdTable;
use crate::history::AssessmentHistory;
use crate::planner::PeriodizationPlanner;
use crate::review::ReviewGate;
use crate::storage::{save_or_warn, NullStorage, Storage};
use crate::types::{
    AssessmentResult, Confidence, DetailedContext, GenerationOutcome, ProgramType,
    RawMeasurement, ReviewReason, TrainingProgram, UserPreferences,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Score a measurement with the standard grade table.
///
/// # Example
/// ```ignore
/// let result = score_assessment(&measurement)?;
/// println!("{} ({:.2})", result.predicted_grade, result.composite_score);
/// ```
pub fn score_assessment(measurement: &RawMeasurement) -> Result<AssessmentResult, CoachError> {
    AssessmentScorer::default().score(measurement, SystemClock.now())
}

/// Build the deterministic program for a request, without narration.
///
/// The result is what the narration boundary falls back to.
pub fn plan_program(
    assessment: &AssessmentResult,
    preferences: &UserPreferences,
    program_type: ProgramType,
    context: &DetailedContext,
    created_at: DateTime<Utc>,
) -> Result<TrainingProgram, CoachError> {
    build_program(
        &PeriodizationPlanner::default(),
        assessment,
        preferences,
        program_type,
        context,
        created_at,
    )
}

fn build_program(
    planner: &PeriodizationPlanner,
    assessment: &AssessmentResult,
    preferences: &UserPreferences,
    program_type: ProgramType,
    context: &DetailedContext,
    created_at: DateTime<Utc>,
) -> Result<TrainingProgram, CoachError> {
    validate_preferences(preferences)?;

    let calendar = planner.plan(&preferences.available_days, &assessment.reference_grades)?;
    let mut weeks = calendar.weeks;
    adapt_program(&mut weeks, preferences);

    let decision = ReviewGate::evaluate(assessment, preferences, program_type);

    let mut program = TrainingProgram {
        id: Uuid::new_v4(),
        created_at,
        program_type,
        personalization_score: personalization_score(preferences, program_type, context),
        requires_coach_review: decision.requires_coach_review,
        review_reasons: decision.reasons,
        confidence: decision.confidence,
        ai_insights: assessment.recommendations.clone(),
        generation: GenerationOutcome::Skipped,
        weeks,
    };

    let violations = validate_program(
        &program,
        &ConstraintValidator::for_available_days(distinct_days(preferences)),
        Some(preferences.available_days.as_slice()),
    );
    flag_violations(&mut program, &violations);

    Ok(program)
}

/// A program that fails re-validation goes out only behind a coach review.
fn flag_violations(program: &mut TrainingProgram, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    warn!(program_id = %program.id, ?violations, "planned program failed re-validation");
    program.requires_coach_review = true;
    program.confidence = Confidence::Low;
    if !program.review_reasons.contains(&ReviewReason::ConstraintViolation) {
        program.review_reasons.push(ReviewReason::ConstraintViolation);
    }
}

fn validate_preferences(preferences: &UserPreferences) -> Result<(), CoachError> {
    if preferences.session_length_minutes == 0 {
        return Err(CoachError::configuration(
            "session_length_minutes",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn distinct_days(preferences: &UserPreferences) -> usize {
    let mut days: Vec<u32> = preferences
        .available_days
        .iter()
        .map(|d| d.num_days_from_monday())
        .collect();
    days.sort_unstable();
    days.dedup();
    days.len()
}

/// How much of the request shaped the program (0-100).
///
/// The assessment alone accounts for 40; availability, equipment, goals,
/// injury history, detailed context and program depth add the rest.
pub fn personalization_score(
    preferences: &UserPreferences,
    program_type: ProgramType,
    context: &DetailedContext,
) -> f64 {
    let mut score = 40.0;

    if distinct_days(preferences) >= 3 {
        score += 10.0;
    }
    if !preferences.equipment_access.is_empty() {
        score += 10.0;
    }
    score += 5.0 * preferences.primary_goals.len().min(2) as f64;
    if preferences.has_injury_history() {
        score += 5.0;
    }
    score += 5.0 * context.provided_fields() as f64;
    score += match program_type {
        ProgramType::Quick => 0.0,
        ProgramType::Enhanced => 5.0,
        ProgramType::Optimized => 10.0,
    };

    score.min(100.0)
}

/// Stateful engine with injected collaborators.
///
/// Use this when assessments should be kept as history and programs handed
/// to storage and a narration provider.
pub struct CoachEngine {
    config: CoachConfig,
    scorer: AssessmentScorer,
    planner: PeriodizationPlanner,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    generation: Option<GenerationBoundary>,
    history: AssessmentHistory,
}

impl CoachEngine {
    /// Create an engine from a validated configuration
    pub fn new(config: CoachConfig) -> Result<Self, CoachError> {
        config.validate()?;
        Ok(Self {
            scorer: AssessmentScorer::new(GradeThresholdTable::standard(), config.weakness_threshold),
            planner: PeriodizationPlanner::new(config.max_active_days),
            storage: Arc::new(NullStorage),
            clock: Arc::new(SystemClock),
            generation: None,
            history: AssessmentHistory::new(),
            config,
        })
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_grade_table(mut self, table: GradeThresholdTable) -> Self {
        self.scorer = AssessmentScorer::new(table, self.config.weakness_threshold);
        self
    }

    pub fn with_narration_provider(mut self, provider: Arc<dyn NarrationProvider>) -> Self {
        self.generation = Some(GenerationBoundary::new(
            provider,
            self.config.generation_timeout(),
        ));
        self
    }

    pub fn with_history(mut self, history: AssessmentHistory) -> Self {
        self.history = history;
        self
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn history(&self) -> &AssessmentHistory {
        &self.history
    }

    /// Score a measurement, record it and hand it to storage
    pub fn assess(&mut self, measurement: &RawMeasurement) -> Result<AssessmentResult, CoachError> {
        let result = self.scorer.score(measurement, self.clock.now())?;

        if let Err(error) = self.history.record(result.clone()) {
            warn!(error = %error, "assessment not added to history");
        }
        save_or_warn("assessment", || self.storage.save_assessment(&result));

        Ok(result)
    }

    /// Generate a six-week program.
    ///
    /// Only validation and configuration errors are returned. Narration and
    /// persistence failures are absorbed.
    pub async fn generate_program(
        &self,
        assessment: &AssessmentResult,
        preferences: &UserPreferences,
        program_type: ProgramType,
        context: &DetailedContext,
    ) -> Result<TrainingProgram, CoachError> {
        let program = build_program(
            &self.planner,
            assessment,
            preferences,
            program_type,
            context,
            self.clock.now(),
        )?;

        let program = match (&self.generation, program_type) {
            (Some(boundary), ProgramType::Enhanced | ProgramType::Optimized) => {
                let request = NarrationRequest::for_program(&program, assessment, context);
                boundary.enrich(program, &request).await
            }
            _ => program,
        };

        info!(
            program_id = %program.id,
            program_type = program_type.as_str(),
            review = program.requires_coach_review,
            confidence = program.confidence.as_str(),
            "generated program"
        );

        save_or_warn("program", || self.storage.save_program(&program));
        Ok(program)
    }
}
