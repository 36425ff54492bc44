//! Review gate
//!
//! Decides whether a program must be held for a human coach and how much
//! confidence the deterministic pipeline has in it.
//!
//! Review is required when any of these hold:
//! - the climber reported any injury history
//! - the predicted grade is V10 or harder
//! - three or more metrics are weaknesses
//! - an optimized program was requested
//! - a goal mentions competition or a specific route
//!
//! Review triggers only ever add. Nothing downstream can clear them.

use crate::grades::Grade;
use crate::types::{AssessmentResult, Confidence, ProgramType, ReviewReason, UserPreferences};
use serde::{Deserialize, Serialize};

/// Predicted grades at or above this go to a coach
pub const ELITE_GRADE: Grade = Grade::new(10);
/// Weakness count that triggers review
pub const MAX_UNREVIEWED_WEAKNESSES: usize = 2;
/// Goal keywords that trigger review (case-insensitive)
pub const HIGH_STAKES_GOALS: [&str; 2] = ["competition", "specific_route"];

const HIGH_CONFIDENCE_POINTS: u32 = 8;
const MEDIUM_CONFIDENCE_POINTS: u32 = 5;

/// Outcome of the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub requires_coach_review: bool,
    pub reasons: Vec<ReviewReason>,
    pub confidence: Confidence,
    /// Raw points behind the confidence band
    pub confidence_points: u32,
}

/// Safety gate over a planned program
pub struct ReviewGate;

impl ReviewGate {
    pub fn evaluate(
        assessment: &AssessmentResult,
        preferences: &UserPreferences,
        program_type: ProgramType,
    ) -> ReviewDecision {
        let reasons = Self::review_reasons(assessment, preferences, program_type);
        let confidence_points = Self::confidence_points(assessment, preferences, program_type);

        ReviewDecision {
            requires_coach_review: !reasons.is_empty(),
            reasons,
            confidence: confidence_band(confidence_points),
            confidence_points,
        }
    }

    pub fn review_reasons(
        assessment: &AssessmentResult,
        preferences: &UserPreferences,
        program_type: ProgramType,
    ) -> Vec<ReviewReason> {
        let mut reasons = Vec::new();

        if preferences.has_injury_history() {
            reasons.push(ReviewReason::InjuryHistory);
        }
        if assessment.predicted_grade >= ELITE_GRADE {
            reasons.push(ReviewReason::EliteGrade);
        }
        if assessment.weaknesses.len() > MAX_UNREVIEWED_WEAKNESSES {
            reasons.push(ReviewReason::MultipleWeaknesses);
        }
        if program_type == ProgramType::Optimized {
            reasons.push(ReviewReason::OptimizedProgram);
        }
        if has_high_stakes_goal(&preferences.primary_goals) {
            reasons.push(ReviewReason::HighStakesGoal);
        }

        reasons
    }

    pub fn confidence_points(
        assessment: &AssessmentResult,
        preferences: &UserPreferences,
        program_type: ProgramType,
    ) -> u32 {
        let mut points = 0;

        let composite = assessment.composite_score;
        if composite.is_finite() && (0.0..=1.5).contains(&composite) {
            points += 3;
        }
        if assessment.weaknesses.len() <= MAX_UNREVIEWED_WEAKNESSES {
            points += 2;
        }
        if distinct_days(preferences) >= 3 {
            points += 2;
        }
        if preferences.equipment_access.len() >= 2 {
            points += 1;
        }
        points += match program_type {
            ProgramType::Optimized => 3,
            ProgramType::Enhanced => 2,
            ProgramType::Quick => 1,
        };

        points
    }
}

pub fn confidence_band(points: u32) -> Confidence {
    if points >= HIGH_CONFIDENCE_POINTS {
        Confidence::High
    } else if points >= MEDIUM_CONFIDENCE_POINTS {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn has_high_stakes_goal(goals: &[String]) -> bool {
    goals.iter().any(|goal| {
        let goal = goal.to_lowercase();
        HIGH_STAKES_GOALS.iter().any(|keyword| goal.contains(keyword))
    })
}

fn distinct_days(preferences: &UserPreferences) -> usize {
    let mut days = preferences.available_days.clone();
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    days.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentScorer;
    use crate::types::{Equipment, MetricKind, RawMeasurement};
    use chrono::{TimeZone, Utc, Weekday};
    use pretty_assertions::assert_eq;

    fn assessment() -> AssessmentResult {
        let measurement = RawMeasurement {
            body_weight_kg: 65.0,
            height_cm: 172.0,
            added_weight_kg: 35.0,
            max_pull_ups: 40,
            max_push_ups: 50,
            max_toe_to_bar: 30,
            leg_spread_cm: 200.0,
            eighty_percent_grade: Grade::new(5),
        };
        AssessmentScorer::default()
            .score(&measurement, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
            .unwrap()
    }

    fn preferences() -> UserPreferences {
        UserPreferences {
            available_days: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            session_length_minutes: 90,
            equipment_access: vec![Equipment::Fingerboard, Equipment::ClimbingGym],
            primary_goals: vec!["Send my first V6".to_string()],
            injury_history: Vec::new(),
        }
    }

    #[test]
    fn test_clean_request_passes() {
        let a = assessment();
        assert!(a.weaknesses.len() <= 2);

        let decision = ReviewGate::evaluate(&a, &preferences(), ProgramType::Enhanced);
        assert!(!decision.requires_coach_review);
        assert!(decision.reasons.is_empty());
        // 3 + 2 + 2 + 1 + 2
        assert_eq!(decision.confidence_points, 10);
        assert_eq!(decision.confidence, Confidence::High);
    }

    #[test]
    fn test_injury_forces_review_for_quick_program() {
        let mut prefs = preferences();
        prefs.injury_history = vec!["finger".to_string()];

        let decision = ReviewGate::evaluate(&assessment(), &prefs, ProgramType::Quick);
        assert!(decision.requires_coach_review);
        assert_eq!(decision.reasons, vec![ReviewReason::InjuryHistory]);
    }

    #[test]
    fn test_every_trigger_is_reported() {
        let mut a = assessment();
        a.predicted_grade = Grade::new(10);
        a.weaknesses = vec![MetricKind::Core, MetricKind::PushUps, MetricKind::Flexibility];

        let mut prefs = preferences();
        prefs.injury_history = vec!["shoulder".to_string()];
        prefs.primary_goals = vec!["Regional COMPETITION finals".to_string()];

        let decision = ReviewGate::evaluate(&a, &prefs, ProgramType::Optimized);
        assert_eq!(
            decision.reasons,
            vec![
                ReviewReason::InjuryHistory,
                ReviewReason::EliteGrade,
                ReviewReason::MultipleWeaknesses,
                ReviewReason::OptimizedProgram,
                ReviewReason::HighStakesGoal,
            ]
        );
    }

    #[test]
    fn test_specific_route_goal() {
        let mut prefs = preferences();
        prefs.primary_goals = vec!["specific_route: Midnight Lightning".to_string()];
        let reasons = ReviewGate::review_reasons(&assessment(), &prefs, ProgramType::Quick);
        assert_eq!(reasons, vec![ReviewReason::HighStakesGoal]);
    }

    #[test]
    fn test_sparse_request_has_low_confidence() {
        let mut a = assessment();
        a.weaknesses = MetricKind::ALL.to_vec();
        let prefs = UserPreferences {
            available_days: vec![Weekday::Sat, Weekday::Sat],
            equipment_access: Vec::new(),
            ..preferences()
        };

        // 3 (composite) + 1 (quick)
        assert_eq!(ReviewGate::confidence_points(&a, &prefs, ProgramType::Quick), 4);
        assert_eq!(
            ReviewGate::evaluate(&a, &prefs, ProgramType::Quick).confidence,
            Confidence::Low
        );
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(confidence_band(11), Confidence::High);
        assert_eq!(confidence_band(8), Confidence::High);
        assert_eq!(confidence_band(7), Confidence::Medium);
        assert_eq!(confidence_band(5), Confidence::Medium);
        assert_eq!(confidence_band(4), Confidence::Low);
    }
}
