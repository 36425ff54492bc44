//! Session catalog
//!
//! Prescriptions for every session type in every phase. Progressive loading
//! rises monotonically through weeks 1-4, so the week 4 prescription is the
//! baseline the deload week halves.

use crate::grades::ReferenceGrades;
use crate::types::{Grip, HoldSource, HoldSpec, Phase, PullGrip, Session, SessionNote, SessionType};

/// Deload weeks run at exactly this fraction of the baseline
pub const DELOAD_FACTOR: f64 = 0.5;

/// Number of progressive weeks before the deload
pub const PROGRESSIVE_WEEKS: u8 = 4;
pub const DELOAD_WEEK: u8 = 5;
pub const ASSESSMENT_WEEK: u8 = 6;

/// Exercise note carried by the loaded strength circuit
pub const LOADED_CIRCUIT_NOTE: &str = "Weighted pull-ups, push-ups and hanging leg raises";

/// Intensity and volume of one prescription
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prescription {
    pub intensity: f64,
    pub volume: f64,
}

impl Prescription {
    const fn new(intensity: f64, volume: f64) -> Self {
        Self { intensity, volume }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            intensity: self.intensity * factor,
            volume: self.volume * factor,
        }
    }
}

/// Phase is a pure function of the week number.
pub fn phase_for_week(week: u8) -> Phase {
    match week {
        DELOAD_WEEK => Phase::Deload,
        ASSESSMENT_WEEK => Phase::Assessment,
        _ => Phase::Progressive,
    }
}

/// Progressive prescription for weeks 1-4. Rest has none.
pub fn progressive(session_type: SessionType, week: u8) -> Prescription {
    let index = usize::from(week.clamp(1, PROGRESSIVE_WEEKS) - 1);
    let table: [Prescription; 4] = match session_type {
        // Sets at percent of max hang load
        SessionType::Fingerboard => [
            Prescription::new(0.95, 3.0),
            Prescription::new(0.97, 3.0),
            Prescription::new(1.00, 4.0),
            Prescription::new(1.00, 4.0),
        ],
        // Limit problems attempted
        SessionType::Project => [
            Prescription::new(0.90, 3.0),
            Prescription::new(0.92, 3.0),
            Prescription::new(0.95, 4.0),
            Prescription::new(0.97, 4.0),
        ],
        SessionType::Flash => [
            Prescription::new(0.85, 6.0),
            Prescription::new(0.87, 6.0),
            Prescription::new(0.90, 8.0),
            Prescription::new(0.90, 8.0),
        ],
        SessionType::Technical => [
            Prescription::new(0.60, 6.0),
            Prescription::new(0.60, 6.0),
            Prescription::new(0.65, 8.0),
            Prescription::new(0.65, 8.0),
        ],
        // Circuit rounds
        SessionType::Fitness => [
            Prescription::new(0.65, 3.0),
            Prescription::new(0.70, 3.0),
            Prescription::new(0.70, 4.0),
            Prescription::new(0.75, 4.0),
        ],
        SessionType::Rest => [Prescription::new(0.0, 0.0); 4],
    };
    table[index]
}

/// Peak of the progressive block
pub fn baseline(session_type: SessionType) -> Prescription {
    progressive(session_type, PROGRESSIVE_WEEKS)
}

/// Move range for limit bouldering by progressive week
fn project_moves(week: u8) -> (u32, u32) {
    match week {
        1 | 2 => (5, 6),
        3 => (4, 5),
        _ => (2, 4),
    }
}

/// Session for a progressive week (1-4)
pub fn progressive_session(session_type: SessionType, week: u8, refs: &ReferenceGrades) -> Session {
    let load = progressive(session_type, week);
    let mut session = template(session_type, refs);
    session.target_intensity = load.intensity;
    session.volume = load.volume;
    if session_type == SessionType::Project {
        session.moves = Some(project_moves(week));
    }
    session
}

/// Light variant for the deload week: half the baseline, easier grades
pub fn deload_session(session_type: SessionType, refs: &ReferenceGrades) -> Session {
    let load = baseline(session_type).scaled(DELOAD_FACTOR);
    let mut session = template(session_type, refs);
    session.target_intensity = load.intensity;
    session.volume = load.volume;
    session.loaded = false;

    match session_type {
        SessionType::Fingerboard => {
            session.name = "Light hangs".to_string();
            session.notes = vec![SessionNote::new("Bodyweight hangs, stop well short of failure")];
        }
        SessionType::Project => {
            session.name = "Easy projecting".to_string();
            session.target_grade = Some(refs.flash);
            session.moves = None;
        }
        SessionType::Flash => {
            session.name = "Relaxed mileage".to_string();
            session.target_grade = Some(refs.technical);
        }
        SessionType::Technical => {
            session.name = "Movement flow".to_string();
            session.target_grade = Some(refs.endurance);
        }
        SessionType::Fitness => {
            session.name = "Mobility circuit".to_string();
        }
        SessionType::Rest => {}
    }
    session
}

/// Test sessions for the assessment week
pub fn assessment_session(session_type: SessionType, refs: &ReferenceGrades) -> Session {
    let mut session = template(session_type, refs);
    match session_type {
        SessionType::Fingerboard => {
            session.name = "Max hang test".to_string();
            session.target_intensity = 1.0;
            session.volume = 3.0;
            session.notes = vec![SessionNote::new(
                "Three 10s attempts, record the heaviest clean hang for the next assessment",
            )];
        }
        SessionType::Flash => {
            session.name = "Flash grade test".to_string();
            session.target_intensity = 0.9;
            session.volume = 5.0;
        }
        SessionType::Technical => {
            session.name = "Movement assessment".to_string();
            session.target_intensity = 0.6;
            session.volume = 4.0;
            session.notes = vec![SessionNote::new(
                "Film two problems per style and compare footwork against week 1",
            )];
        }
        _ => {
            let load = baseline(session_type);
            session.target_intensity = load.intensity;
            session.volume = load.volume;
        }
    }
    session
}

/// Shared shape of each session type before loading is applied
fn template(session_type: SessionType, refs: &ReferenceGrades) -> Session {
    let mut session = Session::rest();
    session.session_type = session_type;

    match session_type {
        SessionType::Fingerboard => {
            session.name = "Max hangs".to_string();
            session.rest_period_secs = 180;
            session.warm_up_minutes = 20;
            session.loaded = true;
            session.hold = Some(HoldSpec {
                source: HoldSource::Fingerboard,
                edge_mm: 20,
                grip: Grip::HalfCrimp,
                overhead: true,
            });
            session.notes = vec![SessionNote::new("10s hangs at the prescribed load")];
        }
        SessionType::Project => {
            session.name = "Limit bouldering".to_string();
            session.rest_period_secs = 240;
            session.warm_up_minutes = 25;
            session.target_grade = Some(refs.project);
            session.notes = vec![
                SessionNote::new("Full rest between attempts, stop when movement quality drops"),
                SessionNote::outdoor("If conditions allow, take this session to an outdoor project"),
            ];
        }
        SessionType::Flash => {
            session.name = "Flash attempts".to_string();
            session.rest_period_secs = 180;
            session.warm_up_minutes = 20;
            session.target_grade = Some(refs.flash);
            session.notes = vec![
                SessionNote::new("Read each problem fully before pulling on"),
                SessionNote::outdoor("Unfamiliar outdoor circuits make good onsight practice"),
            ];
        }
        SessionType::Technical => {
            session.name = "Technique drills".to_string();
            session.rest_period_secs = 60;
            session.warm_up_minutes = 15;
            session.target_grade = Some(refs.technical);
            session.notes = vec![SessionNote::new("Silent feet, straight arms, precise placements")];
        }
        SessionType::Fitness => {
            session.name = "Strength circuit".to_string();
            session.rest_period_secs = 90;
            session.warm_up_minutes = 10;
            session.loaded = true;
            session.pull_grip = Some(PullGrip::Pronated);
            session.target_grade = Some(refs.endurance);
            session.notes = vec![SessionNote::new(LOADED_CIRCUIT_NOTE)];
        }
        SessionType::Rest => {}
    }
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::Grade;

    fn refs() -> ReferenceGrades {
        ReferenceGrades::from_eighty_percent(Grade::new(5))
    }

    #[test]
    fn test_phases_by_week() {
        assert_eq!(phase_for_week(1), Phase::Progressive);
        assert_eq!(phase_for_week(4), Phase::Progressive);
        assert_eq!(phase_for_week(5), Phase::Deload);
        assert_eq!(phase_for_week(6), Phase::Assessment);
    }

    #[test]
    fn test_fingerboard_progression() {
        let sets: Vec<(f64, f64)> = (1..=4)
            .map(|w| {
                let p = progressive(SessionType::Fingerboard, w);
                (p.volume, p.intensity)
            })
            .collect();
        assert_eq!(sets, vec![(3.0, 0.95), (3.0, 0.97), (4.0, 1.0), (4.0, 1.0)]);
    }

    #[test]
    fn test_loading_never_decreases() {
        for session_type in [
            SessionType::Fingerboard,
            SessionType::Project,
            SessionType::Flash,
            SessionType::Technical,
            SessionType::Fitness,
        ] {
            for week in 1..PROGRESSIVE_WEEKS {
                let now = progressive(session_type, week);
                let next = progressive(session_type, week + 1);
                assert!(next.intensity >= now.intensity, "{session_type:?} week {week}");
                assert!(next.volume >= now.volume, "{session_type:?} week {week}");
            }
        }
    }

    #[test]
    fn test_project_moves_shrink() {
        let moves: Vec<_> = (1..=4)
            .map(|w| progressive_session(SessionType::Project, w, &refs()).moves)
            .collect();
        assert_eq!(
            moves,
            vec![Some((5, 6)), Some((5, 6)), Some((4, 5)), Some((2, 4))]
        );
    }

    #[test]
    fn test_deload_is_exactly_half_of_baseline() {
        let fb = deload_session(SessionType::Fingerboard, &refs());
        assert_eq!(fb.volume, 2.0);
        assert_eq!(fb.target_intensity, 0.5);

        let project = deload_session(SessionType::Project, &refs());
        assert_eq!(project.target_intensity, baseline(SessionType::Project).intensity * 0.5);
        assert_eq!(project.volume, baseline(SessionType::Project).volume * 0.5);
        assert!(project.target_grade < Some(refs().project));
    }
}
