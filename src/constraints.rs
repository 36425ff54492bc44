//! Placement constraints
//!
//! Declarative spacing and frequency rules over session placements. The
//! planner asks after every placement whether the next one is legal, so an
//! invalid plan is never accumulated. `validate_program` replays the same
//! rules over a finished program together with the week-level invariants.

use crate::adapters::injury;
use crate::catalog;
use crate::types::{Phase, SessionType, TrainingProgram, PROGRAM_WEEKS, WEEKDAYS};
use chrono::Weekday;
use serde::Serialize;
use thiserror::Error;

/// Minimum rest days in any week
pub const MIN_REST_DAYS_PER_WEEK: usize = 2;
/// Minimum rest days in the assessment week
pub const MIN_ASSESSMENT_WEEK_REST_DAYS: usize = 3;
/// High-intensity days allowed in the assessment week
pub const MAX_ASSESSMENT_WEEK_HIGH_INTENSITY_DAYS: usize = 1;

const DELOAD_TOLERANCE: f64 = 1e-9;

/// A day in the program calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// Week number, 1-based
    pub week: u8,
    pub weekday: Weekday,
}

impl CalendarDay {
    pub fn new(week: u8, weekday: Weekday) -> Self {
        Self { week, weekday }
    }

    /// Days since Monday of week 1
    pub fn ordinal(&self) -> i64 {
        (i64::from(self.week) - 1) * 7 + i64::from(self.weekday.num_days_from_monday())
    }

    pub fn from_ordinal(ordinal: i64) -> Self {
        let ordinal = ordinal.max(0);
        let week = (ordinal / 7 + 1).min(i64::from(u8::MAX)) as u8;
        let weekday = WEEKDAYS[(ordinal % 7) as usize];
        Self { week, weekday }
    }

    pub fn hours_until(&self, later: &CalendarDay) -> i64 {
        (later.ordinal() - self.ordinal()) * 24
    }
}

// chrono::Weekday has no ordering, so days compare by ordinal
impl Ord for CalendarDay {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl PartialOrd for CalendarDay {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Spacing and frequency rule for one session type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConstraintRule {
    pub session_type: SessionType,
    pub min_hours_apart: u32,
    pub max_per_week: Option<u32>,
}

/// The fixed rule set
pub const RULES: [ConstraintRule; 5] = [
    ConstraintRule {
        session_type: SessionType::Fingerboard,
        min_hours_apart: 72,
        max_per_week: Some(2),
    },
    ConstraintRule {
        session_type: SessionType::Project,
        min_hours_apart: 48,
        max_per_week: Some(2),
    },
    ConstraintRule {
        session_type: SessionType::Flash,
        min_hours_apart: 48,
        max_per_week: Some(2),
    },
    ConstraintRule {
        session_type: SessionType::Technical,
        min_hours_apart: 24,
        max_per_week: Some(3),
    },
    ConstraintRule {
        session_type: SessionType::Fitness,
        min_hours_apart: 24,
        max_per_week: Some(2),
    },
];

/// A non-rest session pinned to a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub day: CalendarDay,
    pub session_type: SessionType,
}

/// Placements accepted so far
#[derive(Debug, Clone, Default)]
pub struct PlanSoFar {
    placements: Vec<Placement>,
}

impl PlanSoFar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest is not a placement and is ignored.
    pub fn push(&mut self, day: CalendarDay, session_type: SessionType) {
        if !session_type.is_rest() {
            self.placements.push(Placement { day, session_type });
        }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn last_of(&self, session_type: SessionType) -> Option<CalendarDay> {
        self.placements
            .iter()
            .filter(|p| p.session_type == session_type)
            .map(|p| p.day)
            .max()
    }

    fn in_week(&self, week: u8) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.day.week == week)
    }
}

/// A broken rule, either during placement or in a finished program
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    #[error("{session_type:?} on {day:?} is only {hours}h after the previous one (needs {required}h)")]
    SpacingTooShort {
        session_type: SessionType,
        day: CalendarDay,
        hours: i64,
        required: u32,
    },

    #[error("high-intensity session on {day:?} follows a high-intensity day")]
    ConsecutiveHighIntensity { day: CalendarDay },

    #[error("{session_type:?} limit of {limit} per week reached in week {week}")]
    WeeklyLimit {
        session_type: SessionType,
        week: u8,
        limit: u32,
    },

    #[error("high-intensity limit of {limit} days reached in week {week}")]
    HighIntensityCap { week: u8, limit: usize },

    #[error("{day:?} already has a session")]
    DayOccupied { day: CalendarDay },

    #[error("week {week} has {rest_days} rest days (needs {required})")]
    InsufficientRest {
        week: u8,
        rest_days: usize,
        required: usize,
    },

    #[error("assessment week has {days} high-intensity days")]
    AssessmentWeekOverload { days: usize },

    #[error("deload {session_type:?} on {day:?} is not half of the baseline")]
    DeloadMismatch {
        session_type: SessionType,
        day: CalendarDay,
    },

    #[error("session on {day:?} falls outside the available days")]
    UnavailableDay { day: CalendarDay },

    #[error("week {week} is labelled {found:?}, expected {expected:?}")]
    WrongPhase { week: u8, found: Phase, expected: Phase },

    #[error("program has {found} weeks, expected {expected}")]
    WrongWeekCount { found: usize, expected: usize },

    #[error("week {week} does not list the seven calendar days in order")]
    MalformedWeek { week: u8 },
}

/// Answers whether a placement is legal given the plan so far
#[derive(Debug, Clone)]
pub struct ConstraintValidator {
    rules: Vec<ConstraintRule>,
    max_high_intensity_per_week: usize,
}

impl ConstraintValidator {
    pub fn new(max_high_intensity_per_week: usize) -> Self {
        Self {
            rules: RULES.to_vec(),
            max_high_intensity_per_week,
        }
    }

    /// Keeps two of the available days free of high-intensity work.
    pub fn for_available_days(available_days: usize) -> Self {
        Self::new(available_days.saturating_sub(MIN_REST_DAYS_PER_WEEK))
    }

    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    pub fn rule_for(&self, session_type: SessionType) -> Option<&ConstraintRule> {
        self.rules.iter().find(|r| r.session_type == session_type)
    }

    pub fn max_high_intensity_per_week(&self) -> usize {
        self.max_high_intensity_per_week
    }

    pub fn is_placement_valid(
        &self,
        day: CalendarDay,
        session_type: SessionType,
        plan: &PlanSoFar,
    ) -> bool {
        self.check_placement(day, session_type, plan).is_ok()
    }

    /// Same as `is_placement_valid`, reporting the first broken rule.
    pub fn check_placement(
        &self,
        day: CalendarDay,
        session_type: SessionType,
        plan: &PlanSoFar,
    ) -> Result<(), Violation> {
        if session_type.is_rest() {
            return Ok(());
        }

        if plan.placements().iter().any(|p| p.day == day) {
            return Err(Violation::DayOccupied { day });
        }

        if let Some(rule) = self.rule_for(session_type) {
            for previous in plan
                .placements()
                .iter()
                .filter(|p| p.session_type == session_type)
            {
                let hours = (day.ordinal() - previous.day.ordinal()).abs() * 24;
                if hours < i64::from(rule.min_hours_apart) {
                    return Err(Violation::SpacingTooShort {
                        session_type,
                        day,
                        hours,
                        required: rule.min_hours_apart,
                    });
                }
            }

            if let Some(limit) = rule.max_per_week {
                let count = plan
                    .in_week(day.week)
                    .filter(|p| p.session_type == session_type)
                    .count();
                if count as u32 >= limit {
                    return Err(Violation::WeeklyLimit {
                        session_type,
                        week: day.week,
                        limit,
                    });
                }
            }
        }

        if session_type.is_high_intensity() {
            let adjacent = plan.placements().iter().any(|p| {
                p.session_type.is_high_intensity() && (p.day.ordinal() - day.ordinal()).abs() == 1
            });
            if adjacent {
                return Err(Violation::ConsecutiveHighIntensity { day });
            }

            let high_days = plan
                .in_week(day.week)
                .filter(|p| p.session_type.is_high_intensity())
                .count();
            if high_days >= self.max_high_intensity_per_week {
                return Err(Violation::HighIntensityCap {
                    week: day.week,
                    limit: self.max_high_intensity_per_week,
                });
            }
        }

        Ok(())
    }

    /// First day the spacing rule allows another session of this type.
    pub fn earliest_valid_day(
        &self,
        session_type: SessionType,
        last_placement_day: Option<CalendarDay>,
    ) -> CalendarDay {
        let Some(last) = last_placement_day else {
            return CalendarDay::new(1, Weekday::Mon);
        };

        let spacing_days = self
            .rule_for(session_type)
            .map(|r| i64::from(r.min_hours_apart.div_ceil(24)))
            .unwrap_or(1)
            .max(1);

        CalendarDay::from_ordinal(last.ordinal() + spacing_days)
    }
}

/// Re-check every invariant on a finished program.
///
/// `available_days` enables the availability check; pass `None` when the
/// request that produced the program is unknown.
pub fn validate_program(
    program: &TrainingProgram,
    validator: &ConstraintValidator,
    available_days: Option<&[Weekday]>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if program.weeks.len() != PROGRAM_WEEKS {
        violations.push(Violation::WrongWeekCount {
            found: program.weeks.len(),
            expected: PROGRAM_WEEKS,
        });
    }

    let mut plan = PlanSoFar::new();

    for week in &program.weeks {
        let expected_phase = catalog::phase_for_week(week.number);
        if week.phase != expected_phase {
            violations.push(Violation::WrongPhase {
                week: week.number,
                found: week.phase,
                expected: expected_phase,
            });
        }

        let weekdays: Vec<Weekday> = week.days.iter().map(|d| d.weekday).collect();
        if weekdays != WEEKDAYS {
            violations.push(Violation::MalformedWeek { week: week.number });
        }

        let rest_days = week.rest_days();
        let required_rest = if week.phase == Phase::Assessment {
            MIN_ASSESSMENT_WEEK_REST_DAYS
        } else {
            MIN_REST_DAYS_PER_WEEK
        };
        if rest_days < required_rest {
            violations.push(Violation::InsufficientRest {
                week: week.number,
                rest_days,
                required: required_rest,
            });
        }

        if week.phase == Phase::Assessment
            && week.high_intensity_days() > MAX_ASSESSMENT_WEEK_HIGH_INTENSITY_DAYS
        {
            violations.push(Violation::AssessmentWeekOverload {
                days: week.high_intensity_days(),
            });
        }

        for day in &week.days {
            let calendar_day = CalendarDay::new(week.number, day.weekday);

            for session in day.sessions.iter().filter(|s| !s.is_rest()) {
                if let Some(available) = available_days {
                    if !available.contains(&day.weekday) {
                        violations.push(Violation::UnavailableDay { day: calendar_day });
                    }
                }

                if let Err(violation) =
                    validator.check_placement(calendar_day, session.session_type, &plan)
                {
                    violations.push(violation);
                }
                plan.push(calendar_day, session.session_type);

                if week.phase == Phase::Deload {
                    let baseline = catalog::baseline(session.session_type);
                    let factor = injury::intensity_factor(session);
                    let intensity_ok = (session.target_intensity
                        - baseline.intensity * factor * catalog::DELOAD_FACTOR)
                        .abs()
                        < DELOAD_TOLERANCE;
                    let volume_ok = (session.volume - baseline.volume * catalog::DELOAD_FACTOR)
                        .abs()
                        < DELOAD_TOLERANCE;
                    if !intensity_ok || !volume_ok {
                        violations.push(Violation::DeloadMismatch {
                            session_type: session.session_type,
                            day: calendar_day,
                        });
                    }
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(week: u8, weekday: Weekday) -> CalendarDay {
        CalendarDay::new(week, weekday)
    }

    #[test]
    fn test_calendar_ordinals_cross_weeks() {
        assert_eq!(day(1, Weekday::Mon).ordinal(), 0);
        assert_eq!(day(2, Weekday::Mon).ordinal(), 7);
        assert_eq!(CalendarDay::from_ordinal(9), day(2, Weekday::Wed));
        assert_eq!(day(1, Weekday::Sun).hours_until(&day(2, Weekday::Tue)), 48);
    }

    #[test]
    fn test_calendar_days_order_by_ordinal() {
        assert!(day(1, Weekday::Sun) < day(2, Weekday::Mon));
        assert!(day(2, Weekday::Tue) > day(2, Weekday::Mon));

        let mut plan = PlanSoFar::new();
        plan.push(day(2, Weekday::Mon), SessionType::Project);
        plan.push(day(1, Weekday::Sat), SessionType::Project);
        assert_eq!(plan.last_of(SessionType::Project), Some(day(2, Weekday::Mon)));
        assert_eq!(plan.last_of(SessionType::Flash), None);
    }

    #[test]
    fn test_fingerboard_needs_72_hours() {
        let validator = ConstraintValidator::new(5);
        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Mon), SessionType::Fingerboard);

        assert!(!validator.is_placement_valid(day(1, Weekday::Wed), SessionType::Fingerboard, &plan));
        assert!(validator.is_placement_valid(day(1, Weekday::Thu), SessionType::Fingerboard, &plan));
    }

    #[test]
    fn test_spacing_spans_week_boundary() {
        let validator = ConstraintValidator::new(5);
        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Sun), SessionType::Project);

        let err = validator
            .check_placement(day(2, Weekday::Mon), SessionType::Project, &plan)
            .unwrap_err();
        assert!(matches!(err, Violation::SpacingTooShort { hours: 24, required: 48, .. }));
    }

    #[test]
    fn test_project_and_flash_spaced_independently() {
        let validator = ConstraintValidator::new(5);
        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Mon), SessionType::Project);

        // Flash has its own clock, only the consecutive-day rule applies
        assert!(validator.is_placement_valid(day(1, Weekday::Wed), SessionType::Flash, &plan));
        assert!(!validator.is_placement_valid(day(1, Weekday::Tue), SessionType::Flash, &plan));
    }

    #[test]
    fn test_no_consecutive_high_intensity_days() {
        let validator = ConstraintValidator::new(5);
        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Tue), SessionType::Fingerboard);

        assert!(matches!(
            validator.check_placement(day(1, Weekday::Mon), SessionType::Project, &plan),
            Err(Violation::ConsecutiveHighIntensity { .. })
        ));
        assert!(validator.is_placement_valid(day(1, Weekday::Wed), SessionType::Technical, &plan));
    }

    #[test]
    fn test_high_intensity_cap_follows_available_days() {
        let validator = ConstraintValidator::for_available_days(3);
        assert_eq!(validator.max_high_intensity_per_week(), 1);

        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Mon), SessionType::Fingerboard);
        assert!(matches!(
            validator.check_placement(day(1, Weekday::Thu), SessionType::Project, &plan),
            Err(Violation::HighIntensityCap { limit: 1, .. })
        ));
        // Next week starts a fresh count
        assert!(validator.is_placement_valid(day(2, Weekday::Thu), SessionType::Project, &plan));
    }

    #[test]
    fn test_weekly_limit() {
        let validator = ConstraintValidator::new(7);
        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Mon), SessionType::Fitness);
        plan.push(day(1, Weekday::Wed), SessionType::Fitness);
        assert!(matches!(
            validator.check_placement(day(1, Weekday::Fri), SessionType::Fitness, &plan),
            Err(Violation::WeeklyLimit { limit: 2, .. })
        ));
    }

    #[test]
    fn test_rest_is_always_valid() {
        let validator = ConstraintValidator::new(0);
        let mut plan = PlanSoFar::new();
        plan.push(day(1, Weekday::Mon), SessionType::Fingerboard);
        assert!(validator.is_placement_valid(day(1, Weekday::Mon), SessionType::Rest, &plan));
        plan.push(day(1, Weekday::Tue), SessionType::Rest);
        assert_eq!(plan.placements().len(), 1);
    }

    #[test]
    fn test_earliest_valid_day() {
        let validator = ConstraintValidator::new(5);
        assert_eq!(
            validator.earliest_valid_day(SessionType::Fingerboard, None),
            day(1, Weekday::Mon)
        );
        assert_eq!(
            validator.earliest_valid_day(SessionType::Fingerboard, Some(day(1, Weekday::Sat))),
            day(2, Weekday::Tue)
        );
        assert_eq!(
            validator.earliest_valid_day(SessionType::Technical, Some(day(1, Weekday::Mon))),
            day(1, Weekday::Tue)
        );
        assert_eq!(
            validator.earliest_valid_day(SessionType::Flash, Some(day(1, Weekday::Mon))),
            day(1, Weekday::Wed)
        );
    }
}
