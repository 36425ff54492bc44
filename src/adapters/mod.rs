//! Plan adapters
//!
//! This module provides adapters that rewrite session content after the
//! calendar is fixed: injury restrictions and equipment substitutions. They
//! never add, remove or move sessions.
//!
//! Every adapter is idempotent. A change is applied only while its
//! `Modification` marker is absent, so re-running an adapter is a no-op.

pub mod equipment;
pub mod injury;

pub use equipment::EquipmentAdapter;
pub use injury::{BodyRegion, InjuryAdapter, InjuryProfile};

use crate::types::{UserPreferences, Week};

/// Trait for session-content adapters
pub trait PlanAdapter {
    fn name(&self) -> &'static str;

    /// Rewrite sessions in place
    fn adapt(&self, weeks: &mut [Week]);
}

/// Adapters implied by the preferences, in application order
pub fn adapters_for(preferences: &UserPreferences) -> Vec<Box<dyn PlanAdapter>> {
    vec![
        Box::new(InjuryAdapter::new(InjuryProfile::from_history(
            &preferences.injury_history,
        ))),
        Box::new(EquipmentAdapter::from_preferences(preferences)),
    ]
}

/// Apply every adapter implied by the preferences.
pub fn adapt_program(weeks: &mut [Week], preferences: &UserPreferences) {
    for adapter in adapters_for(preferences) {
        adapter.adapt(weeks);
        tracing::debug!(adapter = adapter.name(), "applied plan adapter");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::{Grade, ReferenceGrades};
    use crate::planner::PeriodizationPlanner;
    use crate::types::{Equipment, Modification, SessionType, WEEKDAYS};
    use pretty_assertions::assert_eq;

    fn planned_weeks() -> Vec<Week> {
        let refs = ReferenceGrades::from_eighty_percent(Grade::new(6));
        PeriodizationPlanner::default()
            .plan(&WEEKDAYS, &refs)
            .unwrap()
            .weeks
    }

    fn preferences(injuries: &[&str], equipment: Vec<Equipment>) -> UserPreferences {
        UserPreferences {
            available_days: WEEKDAYS.to_vec(),
            session_length_minutes: 90,
            equipment_access: equipment,
            primary_goals: Vec::new(),
            injury_history: injuries.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_adapting_twice_equals_adapting_once() {
        let prefs = preferences(&["finger pulley", "elbow", "shoulder", "lower back"], Vec::new());

        let mut once = planned_weeks();
        adapt_program(&mut once, &prefs);

        let mut twice = once.clone();
        adapt_program(&mut twice, &prefs);

        assert_eq!(twice, once);
    }

    #[test]
    fn test_no_restrictions_leaves_plan_untouched() {
        let prefs = preferences(&[], vec![Equipment::Fingerboard, Equipment::Outdoor]);
        let original = planned_weeks();
        let mut adapted = original.clone();
        adapt_program(&mut adapted, &prefs);
        assert_eq!(adapted, original);
    }

    #[test]
    fn test_adapters_do_not_move_sessions() {
        let prefs = preferences(&["back"], Vec::new());
        let original = planned_weeks();
        let mut adapted = original.clone();
        adapt_program(&mut adapted, &prefs);

        for (before, after) in original.iter().zip(&adapted) {
            let types_before: Vec<SessionType> =
                before.sessions().map(|s| s.session_type).collect();
            let types_after: Vec<SessionType> = after.sessions().map(|s| s.session_type).collect();
            assert_eq!(types_before, types_after);
        }
        assert!(adapted
            .iter()
            .flat_map(|w| w.sessions())
            .any(|s| s.has_modification(Modification::NoWeightedLoad)));
    }
}
