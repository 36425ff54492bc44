//! Core types for the Crux engine
//!
//! This module defines the data structures that flow through each stage:
//! raw measurements, normalized metrics, assessment results, and the
//! week/day/session structure of a training program.

use crate::grades::{Grade, ReferenceGrades};
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five physical-performance dimensions scored by an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    FingerStrength,
    PullUps,
    PushUps,
    Core,
    Flexibility,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::FingerStrength,
        MetricKind::PullUps,
        MetricKind::PushUps,
        MetricKind::Core,
        MetricKind::Flexibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::FingerStrength => "finger_strength",
            MetricKind::PullUps => "pull_ups",
            MetricKind::PushUps => "push_ups",
            MetricKind::Core => "core",
            MetricKind::Flexibility => "flexibility",
        }
    }
}

/// One assessment event's measurements. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// Body weight (kg, > 0)
    pub body_weight_kg: f64,
    /// Height (cm, > 0)
    pub height_cm: f64,
    /// Weight added to a max hang (kg, negative for assisted hangs)
    pub added_weight_kg: f64,
    pub max_pull_ups: u32,
    pub max_push_ups: u32,
    pub max_toe_to_bar: u32,
    /// Straddle leg spread (cm)
    pub leg_spread_cm: f64,
    /// Grade the climber sends roughly 80% of the time
    pub eighty_percent_grade: Grade,
}

impl RawMeasurement {
    /// Check ranges that the type system does not.
    pub fn validate(&self) -> Result<(), crate::CoachError> {
        use crate::CoachError;

        if !self.body_weight_kg.is_finite() || self.body_weight_kg <= 0.0 {
            return Err(CoachError::validation(
                "body_weight_kg",
                format!("must be a positive number, got {}", self.body_weight_kg),
            ));
        }
        if !self.height_cm.is_finite() || self.height_cm <= 0.0 {
            return Err(CoachError::validation(
                "height_cm",
                format!("must be a positive number, got {}", self.height_cm),
            ));
        }
        if !self.added_weight_kg.is_finite() {
            return Err(CoachError::validation("added_weight_kg", "must be finite"));
        }
        if !self.leg_spread_cm.is_finite() || self.leg_spread_cm < 0.0 {
            return Err(CoachError::validation(
                "leg_spread_cm",
                format!("must be zero or more, got {}", self.leg_spread_cm),
            ));
        }
        Ok(())
    }
}

/// Loosely-filled measurement form as it arrives from a caller.
///
/// Converting into [`RawMeasurement`] names the first missing field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMeasurementDraft {
    pub body_weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub added_weight_kg: Option<f64>,
    pub max_pull_ups: Option<u32>,
    pub max_push_ups: Option<u32>,
    pub max_toe_to_bar: Option<u32>,
    pub leg_spread_cm: Option<f64>,
    pub eighty_percent_grade: Option<String>,
}

impl TryFrom<RawMeasurementDraft> for RawMeasurement {
    type Error = crate::CoachError;

    fn try_from(draft: RawMeasurementDraft) -> Result<Self, Self::Error> {
        use crate::CoachError;

        fn required<T>(value: Option<T>, field: &str) -> Result<T, CoachError> {
            value.ok_or_else(|| CoachError::validation(field, "missing required field"))
        }

        let grade_token = required(draft.eighty_percent_grade, "eighty_percent_grade")?;
        let eighty_percent_grade = grade_token
            .parse::<Grade>()
            .map_err(|e| CoachError::validation("eighty_percent_grade", e.to_string()))?;

        let measurement = RawMeasurement {
            body_weight_kg: required(draft.body_weight_kg, "body_weight_kg")?,
            height_cm: required(draft.height_cm, "height_cm")?,
            added_weight_kg: draft.added_weight_kg.unwrap_or(0.0),
            max_pull_ups: required(draft.max_pull_ups, "max_pull_ups")?,
            max_push_ups: required(draft.max_push_ups, "max_push_ups")?,
            max_toe_to_bar: required(draft.max_toe_to_bar, "max_toe_to_bar")?,
            leg_spread_cm: required(draft.leg_spread_cm, "leg_spread_cm")?,
            eighty_percent_grade,
        };
        measurement.validate()?;
        Ok(measurement)
    }
}

/// A ratio rescaled into a 0-100 score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetric {
    pub kind: MetricKind,
    /// Unscaled ratio (e.g. total hang load / body weight)
    pub raw_ratio: f64,
    /// Score (0-100)
    pub score: f64,
    /// Weight in the composite score
    pub weight: f64,
}

/// Three-level confidence used for grade predictions and programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Scored assessment. History is append-only; the latest result is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: Uuid,
    pub assessed_at: DateTime<Utc>,
    pub measurements: RawMeasurement,
    /// Metrics in canonical order (finger, pull-ups, push-ups, core, flexibility)
    pub metrics: Vec<NormalizedMetric>,
    pub composite_score: f64,
    pub predicted_grade: Grade,
    pub confidence: Confidence,
    pub strongest_area: MetricKind,
    pub weakest_area: MetricKind,
    pub secondary_focus: MetricKind,
    /// Metrics scoring under the weakness threshold, weakest first
    pub weaknesses: Vec<MetricKind>,
    pub recommendations: Vec<String>,
    pub reference_grades: ReferenceGrades,
}

impl AssessmentResult {
    pub fn metric(&self, kind: MetricKind) -> Option<&NormalizedMetric> {
        self.metrics.iter().find(|m| m.kind == kind)
    }
}

/// Session families the planner schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Fingerboard,
    Project,
    Flash,
    Technical,
    Fitness,
    Rest,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Fingerboard => "fingerboard",
            SessionType::Project => "project",
            SessionType::Flash => "flash",
            SessionType::Technical => "technical",
            SessionType::Fitness => "fitness",
            SessionType::Rest => "rest",
        }
    }

    /// Fingerboard, projecting and flashing load fingers near maximally.
    pub fn is_high_intensity(&self) -> bool {
        matches!(
            self,
            SessionType::Fingerboard | SessionType::Project | SessionType::Flash
        )
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, SessionType::Rest)
    }
}

/// Training phase of a week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Progressive,
    Deload,
    Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grip {
    HalfCrimp,
    OpenHand,
}

/// What the climber hangs from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldSource {
    Fingerboard,
    GymHolds,
}

/// Hang prescription for finger-strength work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldSpec {
    pub source: HoldSource,
    pub edge_mm: u32,
    pub grip: Grip,
    /// Straight-arm hang with arms fully overhead
    pub overhead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullGrip {
    Pronated,
    Neutral,
}

/// Coaching note attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNote {
    pub text: String,
    /// Only meaningful for climbers with outdoor access
    #[serde(default)]
    pub outdoor: bool,
}

impl SessionNote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outdoor: false,
        }
    }

    pub fn outdoor(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outdoor: true,
        }
    }
}

/// Marker for each adaptation applied to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modification {
    OpenHandLargerHolds,
    ReducedIntensityElbow,
    ExtendedWarmUp,
    AntagonistWork,
    NoOverheadHangs,
    NeutralPullGrip,
    NoWeightedLoad,
    CoreStabilityRedirect,
    GymHoldSubstitute,
    OutdoorNotesOmitted,
}

/// One training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_type: SessionType,
    pub name: String,
    /// Fraction of maximal effort (1.0 = max)
    pub target_intensity: f64,
    /// Work units: sets for hangs, attempts for bouldering, rounds for circuits
    pub volume: f64,
    /// Rest between work units (seconds)
    pub rest_period_secs: u32,
    pub warm_up_minutes: u32,
    /// Move range for limit bouldering (min, max)
    pub moves: Option<(u32, u32)>,
    pub target_grade: Option<Grade>,
    pub hold: Option<HoldSpec>,
    pub pull_grip: Option<PullGrip>,
    /// Uses added external load
    pub loaded: bool,
    pub notes: Vec<SessionNote>,
    pub modifications: Vec<Modification>,
    /// Human-readable narration attached after structure is fixed
    pub narration: Option<String>,
}

impl Session {
    pub fn rest() -> Self {
        Self {
            session_type: SessionType::Rest,
            name: "Rest".to_string(),
            target_intensity: 0.0,
            volume: 0.0,
            rest_period_secs: 0,
            warm_up_minutes: 0,
            moves: None,
            target_grade: None,
            hold: None,
            pull_grip: None,
            loaded: false,
            notes: Vec::new(),
            modifications: Vec::new(),
            narration: None,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.session_type.is_rest()
    }

    pub fn has_modification(&self, modification: Modification) -> bool {
        self.modifications.contains(&modification)
    }
}

/// One calendar day of a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub weekday: Weekday,
    pub label: String,
    pub sessions: Vec<Session>,
}

impl Day {
    pub fn new(weekday: Weekday, session: Session) -> Self {
        Self {
            weekday,
            label: weekday_label(weekday).to_string(),
            sessions: vec![session],
        }
    }

    /// The day's non-rest session, if any
    pub fn active_session(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| !s.is_rest())
    }

    pub fn is_rest_day(&self) -> bool {
        self.active_session().is_none()
    }

    pub fn is_high_intensity(&self) -> bool {
        self.sessions
            .iter()
            .any(|s| s.session_type.is_high_intensity())
    }
}

/// One week of the program. Always Monday through Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub number: u8,
    pub phase: Phase,
    pub days: Vec<Day>,
}

impl Week {
    pub fn rest_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_rest_day()).count()
    }

    pub fn high_intensity_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_high_intensity()).count()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.days.iter().flat_map(|d| d.sessions.iter())
    }
}

/// Depth of program the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramType {
    Quick,
    Enhanced,
    Optimized,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Quick => "quick",
            ProgramType::Enhanced => "enhanced",
            ProgramType::Optimized => "optimized",
        }
    }
}

/// Training equipment a climber can reach
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Fingerboard,
    ClimbingGym,
    Outdoor,
    Weights,
    SystemBoard,
    CampusBoard,
    #[serde(other)]
    Other,
}

/// Scheduling and safety preferences supplied with a program request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Days the climber can train, highest priority first
    pub available_days: Vec<Weekday>,
    #[serde(default = "default_session_length")]
    pub session_length_minutes: u32,
    #[serde(default)]
    pub equipment_access: Vec<Equipment>,
    #[serde(default)]
    pub primary_goals: Vec<String>,
    #[serde(default)]
    pub injury_history: Vec<String>,
}

fn default_session_length() -> u32 {
    90
}

impl UserPreferences {
    pub fn has_equipment(&self, equipment: &Equipment) -> bool {
        self.equipment_access.contains(equipment)
    }

    /// Blank entries do not count as an injury.
    pub fn has_injury_history(&self) -> bool {
        self.injury_history.iter().any(|i| !i.trim().is_empty())
    }
}

/// Extra context gathered by the conversational front end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedContext {
    pub climbing_years: Option<f64>,
    pub preferred_style: Option<String>,
    pub recent_performance: Option<String>,
    pub notes: Option<String>,
}

impl DetailedContext {
    pub fn provided_fields(&self) -> usize {
        [
            self.climbing_years.is_some(),
            self.preferred_style.is_some(),
            self.recent_performance.is_some(),
            self.notes.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Why a program was held for a coach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    InjuryHistory,
    EliteGrade,
    MultipleWeaknesses,
    OptimizedProgram,
    HighStakesGoal,
    NarrationFallback,
    /// The finished program broke a scheduling or loading rule
    ConstraintViolation,
}

/// What happened at the narration boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// No narration was requested
    Skipped,
    Narrated { provider: String },
    /// Narration was discarded and the deterministic plan emitted
    Fallback { reason: String },
}

/// A complete six-week program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgram {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub program_type: ProgramType,
    pub weeks: Vec<Week>,
    /// How much of the request shaped the program (0-100)
    pub personalization_score: f64,
    pub requires_coach_review: bool,
    pub review_reasons: Vec<ReviewReason>,
    pub confidence: Confidence,
    pub ai_insights: Vec<String>,
    pub generation: GenerationOutcome,
}

pub const PROGRAM_WEEKS: usize = 6;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
