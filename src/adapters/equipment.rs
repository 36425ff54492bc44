//! Equipment substitutions
//!
//! Without a fingerboard, hangs move to gym holds. Without outdoor access,
//! outdoor-only notes are dropped.

use super::PlanAdapter;
use crate::types::{
    Equipment, HoldSource, Modification, Session, SessionType, UserPreferences, Week,
};

/// Adapter for missing equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquipmentAdapter {
    has_fingerboard: bool,
    has_outdoor: bool,
}

impl EquipmentAdapter {
    pub fn new(has_fingerboard: bool, has_outdoor: bool) -> Self {
        Self {
            has_fingerboard,
            has_outdoor,
        }
    }

    pub fn from_preferences(preferences: &UserPreferences) -> Self {
        Self::new(
            preferences.has_equipment(&Equipment::Fingerboard),
            preferences.has_equipment(&Equipment::Outdoor),
        )
    }
}

impl PlanAdapter for EquipmentAdapter {
    fn name(&self) -> &'static str {
        "equipment"
    }

    fn adapt(&self, weeks: &mut [Week]) {
        if self.has_fingerboard && self.has_outdoor {
            return;
        }

        for session in weeks
            .iter_mut()
            .flat_map(|w| w.days.iter_mut())
            .flat_map(|d| d.sessions.iter_mut())
        {
            if !self.has_fingerboard {
                substitute_gym_holds(session);
            }
            if !self.has_outdoor {
                omit_outdoor_notes(session);
            }
        }
    }
}

fn substitute_gym_holds(session: &mut Session) {
    if session.session_type != SessionType::Fingerboard
        || session.has_modification(Modification::GymHoldSubstitute)
    {
        return;
    }

    if let Some(hold) = session.hold.as_mut() {
        hold.source = HoldSource::GymHolds;
    }
    session.name = format!("{} on gym holds", session.name);
    session.modifications.push(Modification::GymHoldSubstitute);
}

fn omit_outdoor_notes(session: &mut Session) {
    let before = session.notes.len();
    session.notes.retain(|note| !note.outdoor);

    if session.notes.len() != before && !session.has_modification(Modification::OutdoorNotesOmitted)
    {
        session.modifications.push(Modification::OutdoorNotesOmitted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::grades::{Grade, ReferenceGrades};
    use crate::types::{Day, Phase};
    use chrono::Weekday;
    use pretty_assertions::assert_eq;

    fn week_of(sessions: &[SessionType]) -> Vec<Week> {
        let refs = ReferenceGrades::from_eighty_percent(Grade::new(3));
        let days = sessions
            .iter()
            .zip([Weekday::Mon, Weekday::Wed, Weekday::Fri])
            .map(|(t, wd)| Day::new(wd, catalog::progressive_session(*t, 2, &refs)))
            .collect();
        vec![Week {
            number: 2,
            phase: Phase::Progressive,
            days,
        }]
    }

    #[test]
    fn test_no_fingerboard_uses_gym_holds() {
        let mut weeks = week_of(&[SessionType::Fingerboard]);
        EquipmentAdapter::new(false, true).adapt(&mut weeks);

        let session = &weeks[0].days[0].sessions[0];
        assert_eq!(session.session_type, SessionType::Fingerboard);
        assert_eq!(session.hold.as_ref().unwrap().source, HoldSource::GymHolds);
        assert_eq!(session.name, "Max hangs on gym holds");
    }

    #[test]
    fn test_outdoor_notes_dropped_without_access() {
        let mut weeks = week_of(&[SessionType::Project, SessionType::Technical]);
        EquipmentAdapter::new(true, false).adapt(&mut weeks);

        let project = &weeks[0].days[0].sessions[0];
        assert!(project.notes.iter().all(|n| !n.outdoor));
        assert!(project.has_modification(Modification::OutdoorNotesOmitted));

        // Nothing outdoor to drop, so no marker
        let technical = &weeks[0].days[1].sessions[0];
        assert!(technical.modifications.is_empty());
    }

    #[test]
    fn test_full_access_keeps_outdoor_notes() {
        let mut weeks = week_of(&[SessionType::Flash]);
        let original = weeks.clone();
        EquipmentAdapter::new(true, true).adapt(&mut weeks);
        assert_eq!(weeks, original);
        assert!(weeks[0].days[0].sessions[0].notes.iter().any(|n| n.outdoor));
    }
}
