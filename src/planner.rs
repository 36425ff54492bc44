//! Periodization planning
//!
//! Builds the six-week calendar phase by phase. Active days alternate between
//! a finger/limit track and a technique/fitness track; every candidate is
//! checked against the constraint validator before it is accepted. Rejected
//! candidates are retried on the next active day, replaced by a lighter
//! session, or the day is left as rest.

use crate::catalog::{self, ASSESSMENT_WEEK};
use crate::constraints::{CalendarDay, ConstraintValidator, PlanSoFar};
use crate::error::CoachError;
use crate::grades::ReferenceGrades;
use crate::types::{Day, Phase, Session, SessionType, Week, WEEKDAYS};
use chrono::Weekday;
use std::collections::HashMap;
use tracing::debug;

/// Most days a week that may carry a session; the other two stay rest days
pub const DEFAULT_MAX_ACTIVE_DAYS: usize = 5;

const TRACK_A: [SessionType; 3] = [
    SessionType::Fingerboard,
    SessionType::Project,
    SessionType::Flash,
];
const TRACK_B: [SessionType; 2] = [SessionType::Technical, SessionType::Fitness];

/// Calendar produced by the planner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCalendar {
    pub weeks: Vec<Week>,
    /// Days that carry sessions, Monday first
    pub active_days: Vec<Weekday>,
    /// Available days dropped to keep two rest days
    pub dropped_days: Vec<Weekday>,
}

/// Planner for the progressive → deload → assessment cycle
#[derive(Debug, Clone)]
pub struct PeriodizationPlanner {
    max_active_days: usize,
}

impl Default for PeriodizationPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTIVE_DAYS)
    }
}

impl PeriodizationPlanner {
    pub fn new(max_active_days: usize) -> Self {
        Self {
            max_active_days: max_active_days.clamp(1, DEFAULT_MAX_ACTIVE_DAYS),
        }
    }

    /// Plan all six weeks for the given availability.
    pub fn plan(
        &self,
        available_days: &[Weekday],
        refs: &ReferenceGrades,
    ) -> Result<PlannedCalendar, CoachError> {
        let (active_days, dropped_days) = select_active_days(available_days, self.max_active_days)?;
        let available_count = active_days.len() + dropped_days.len();
        let validator = ConstraintValidator::for_available_days(available_count);

        if !dropped_days.is_empty() {
            debug!(?dropped_days, "capped active days to keep two rest days");
        }

        let mut state = TrackState::default();
        let mut plan = PlanSoFar::new();
        let mut weeks = Vec::with_capacity(ASSESSMENT_WEEK as usize);

        for number in 1..=ASSESSMENT_WEEK {
            let phase = catalog::phase_for_week(number);
            let sessions = match phase {
                Phase::Progressive | Phase::Deload => {
                    self.plan_training_week(number, phase, &active_days, refs, &validator, &mut plan, &mut state)
                }
                Phase::Assessment => {
                    self.plan_assessment_week(number, &active_days, refs, &validator, &mut plan)
                }
            };
            weeks.push(assemble_week(number, phase, sessions));
        }

        Ok(PlannedCalendar {
            weeks,
            active_days,
            dropped_days,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_training_week(
        &self,
        number: u8,
        phase: Phase,
        active_days: &[Weekday],
        refs: &ReferenceGrades,
        validator: &ConstraintValidator,
        plan: &mut PlanSoFar,
        state: &mut TrackState,
    ) -> HashMap<Weekday, Session> {
        let mut sessions = HashMap::new();

        for (index, weekday) in active_days.iter().enumerate() {
            let day = CalendarDay::new(number, *weekday);
            let preferred = state.next_preferred(index);

            let mut candidates: Vec<SessionType> = state.deferred.clone();
            if !candidates.contains(&preferred) {
                candidates.push(preferred);
            }
            for lighter in TRACK_B {
                if !candidates.contains(&lighter) {
                    candidates.push(lighter);
                }
            }

            let chosen = candidates
                .into_iter()
                .find(|t| validator.is_placement_valid(day, *t, plan));

            match chosen {
                Some(session_type) => {
                    plan.push(day, session_type);
                    state.deferred.retain(|t| *t != session_type);
                    if session_type != preferred {
                        state.defer(preferred);
                        debug!(?day, ?preferred, placed = ?session_type, "deferred session");
                    }
                    let session = if phase == Phase::Deload {
                        catalog::deload_session(session_type, refs)
                    } else {
                        catalog::progressive_session(session_type, number, refs)
                    };
                    sessions.insert(*weekday, session);
                }
                None => {
                    state.defer(preferred);
                    debug!(?day, ?preferred, "no legal session, leaving rest day");
                }
            }
        }

        sessions
    }

    /// At most the first two active days get a test; at most one is
    /// high-intensity.
    fn plan_assessment_week(
        &self,
        number: u8,
        active_days: &[Weekday],
        refs: &ReferenceGrades,
        validator: &ConstraintValidator,
        plan: &mut PlanSoFar,
    ) -> HashMap<Weekday, Session> {
        let mut sessions = HashMap::new();
        let mut used: Vec<SessionType> = Vec::new();

        for weekday in active_days.iter().take(2) {
            let day = CalendarDay::new(number, *weekday);
            let high_placed = used.iter().any(|t| t.is_high_intensity());

            let candidates: &[SessionType] = if high_placed {
                &[SessionType::Technical]
            } else if used.is_empty() {
                &[SessionType::Fingerboard, SessionType::Flash, SessionType::Technical]
            } else {
                &[SessionType::Fingerboard, SessionType::Flash]
            };

            let chosen = candidates
                .iter()
                .copied()
                .filter(|t| !used.contains(t))
                .find(|t| validator.is_placement_valid(day, *t, plan));

            if let Some(session_type) = chosen {
                plan.push(day, session_type);
                used.push(session_type);
                sessions.insert(*weekday, catalog::assessment_session(session_type, refs));
            }
        }

        sessions
    }
}

/// Rotation through the two tracks, carried across weeks
#[derive(Debug, Default)]
struct TrackState {
    a_index: usize,
    b_index: usize,
    deferred: Vec<SessionType>,
}

impl TrackState {
    fn next_preferred(&mut self, day_index: usize) -> SessionType {
        if day_index % 2 == 0 {
            let t = TRACK_A[self.a_index % TRACK_A.len()];
            self.a_index += 1;
            t
        } else {
            let t = TRACK_B[self.b_index % TRACK_B.len()];
            self.b_index += 1;
            t
        }
    }

    fn defer(&mut self, session_type: SessionType) {
        if !self.deferred.contains(&session_type) {
            self.deferred.push(session_type);
        }
    }
}

/// Deduplicate, cap at `max_active` keeping input priority, then sort Monday
/// first. Returns (active, dropped).
pub fn select_active_days(
    available_days: &[Weekday],
    max_active: usize,
) -> Result<(Vec<Weekday>, Vec<Weekday>), CoachError> {
    let mut unique: Vec<Weekday> = Vec::with_capacity(available_days.len());
    for day in available_days {
        if !unique.contains(day) {
            unique.push(*day);
        }
    }

    if unique.is_empty() {
        return Err(CoachError::configuration(
            "available_days",
            "at least one training day is required",
        ));
    }

    let dropped = if unique.len() > max_active {
        unique.split_off(max_active)
    } else {
        Vec::new()
    };

    unique.sort_by_key(|d| d.num_days_from_monday());
    Ok((unique, dropped))
}

fn assemble_week(number: u8, phase: Phase, mut sessions: HashMap<Weekday, Session>) -> Week {
    let days = WEEKDAYS
        .iter()
        .map(|weekday| {
            let session = sessions.remove(weekday).unwrap_or_else(Session::rest);
            Day::new(*weekday, session)
        })
        .collect();

    Week { number, phase, days }
}
