//! Injury restrictions
//!
//! Maps free-text injury history onto body regions and rewrites sessions to
//! stay clear of the affected structures.

use super::PlanAdapter;
use crate::catalog::LOADED_CIRCUIT_NOTE;
use crate::types::{Grip, Modification, PullGrip, Session, SessionNote, SessionType, Week};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fingerboard intensity multiplier for elbow injuries
pub const ELBOW_INTENSITY_FACTOR: f64 = 0.8;
/// Extra warm-up for elbow injuries (minutes)
pub const ELBOW_EXTRA_WARM_UP_MINUTES: u32 = 10;
/// Smallest edge used with an injured finger (mm)
pub const FINGER_MIN_EDGE_MM: u32 = 25;
/// Fingerboard intensity multiplier for finger injuries, keeps hangs submaximal
pub const FINGER_INTENSITY_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyRegion {
    Shoulder,
    Elbow,
    Finger,
    Back,
}

impl BodyRegion {
    /// Match a free-text injury description
    pub fn from_description(description: &str) -> Option<Self> {
        let text = description.to_lowercase();
        if text.contains("finger") || text.contains("pulley") || text.contains("a2") {
            Some(BodyRegion::Finger)
        } else if text.contains("elbow") || text.contains("epicondyl") {
            Some(BodyRegion::Elbow)
        } else if text.contains("shoulder") || text.contains("rotator") || text.contains("labrum") {
            Some(BodyRegion::Shoulder)
        } else if text.contains("back") || text.contains("spine") || text.contains("lumbar") {
            Some(BodyRegion::Back)
        } else {
            None
        }
    }
}

/// Body regions that constrain training
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryProfile {
    regions: BTreeSet<BodyRegion>,
}

impl InjuryProfile {
    pub fn new(regions: impl IntoIterator<Item = BodyRegion>) -> Self {
        Self {
            regions: regions.into_iter().collect(),
        }
    }

    /// Unrecognised descriptions are ignored here; the review gate still
    /// sees the raw history.
    pub fn from_history(history: &[String]) -> Self {
        Self::new(history.iter().filter_map(|h| BodyRegion::from_description(h)))
    }

    pub fn contains(&self, region: BodyRegion) -> bool {
        self.regions.contains(&region)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = &BodyRegion> {
        self.regions.iter()
    }
}

/// Combined intensity multiplier the injury rewrites applied to a session.
///
/// Used to recover the catalog baseline when checking deload sessions.
pub fn intensity_factor(session: &Session) -> f64 {
    if session.session_type != SessionType::Fingerboard {
        return 1.0;
    }
    let mut factor = 1.0;
    if session.has_modification(Modification::OpenHandLargerHolds) {
        factor *= FINGER_INTENSITY_FACTOR;
    }
    if session.has_modification(Modification::ReducedIntensityElbow) {
        factor *= ELBOW_INTENSITY_FACTOR;
    }
    factor
}

/// Adapter applying injury restrictions
pub struct InjuryAdapter {
    profile: InjuryProfile,
}

impl InjuryAdapter {
    pub fn new(profile: InjuryProfile) -> Self {
        Self { profile }
    }
}

impl PlanAdapter for InjuryAdapter {
    fn name(&self) -> &'static str {
        "injury"
    }

    fn adapt(&self, weeks: &mut [Week]) {
        if self.profile.is_empty() {
            return;
        }

        for session in weeks
            .iter_mut()
            .flat_map(|w| w.days.iter_mut())
            .flat_map(|d| d.sessions.iter_mut())
            .filter(|s| !s.is_rest())
        {
            if self.profile.contains(BodyRegion::Finger) {
                protect_finger(session);
            }
            if self.profile.contains(BodyRegion::Elbow) {
                protect_elbow(session);
            }
            if self.profile.contains(BodyRegion::Shoulder) {
                protect_shoulder(session);
            }
            if self.profile.contains(BodyRegion::Back) {
                protect_back(session);
            }
        }
    }
}

/// No max hangs: unloaded, submaximal open-hand hangs on larger holds
fn protect_finger(session: &mut Session) {
    if session.has_modification(Modification::OpenHandLargerHolds) {
        return;
    }

    match session.session_type {
        SessionType::Fingerboard => {
            if let Some(hold) = session.hold.as_mut() {
                hold.grip = Grip::OpenHand;
                hold.edge_mm = hold.edge_mm.max(FINGER_MIN_EDGE_MM);
            }
            session.name = "Open-hand submaximal hangs".to_string();
            session.target_intensity *= FINGER_INTENSITY_FACTOR;
            session.loaded = false;
            session.notes.push(SessionNote::new(
                "Bodyweight only, stop every hang well short of failure",
            ));
        }
        SessionType::Project | SessionType::Flash => {
            session
                .notes
                .push(SessionNote::new("Choose problems on larger holds, avoid hard crimps"));
        }
        _ => return,
    }
    session.modifications.push(Modification::OpenHandLargerHolds);
}

/// Lighter hangs, longer warm-up, antagonist work
fn protect_elbow(session: &mut Session) {
    if session.session_type == SessionType::Fingerboard
        && !session.has_modification(Modification::ReducedIntensityElbow)
    {
        session.target_intensity *= ELBOW_INTENSITY_FACTOR;
        session.modifications.push(Modification::ReducedIntensityElbow);
    }

    if !session.has_modification(Modification::ExtendedWarmUp) {
        session.warm_up_minutes += ELBOW_EXTRA_WARM_UP_MINUTES;
        session.modifications.push(Modification::ExtendedWarmUp);
    }

    if matches!(
        session.session_type,
        SessionType::Fingerboard | SessionType::Fitness
    ) && !session.has_modification(Modification::AntagonistWork)
    {
        session.notes.push(SessionNote::new(
            "Finish with wrist extensor and reverse-grip curl antagonist work",
        ));
        session.modifications.push(Modification::AntagonistWork);
    }
}

/// No straight-arm overhead hangs; neutral grip pulling
fn protect_shoulder(session: &mut Session) {
    match session.session_type {
        SessionType::Fingerboard if !session.has_modification(Modification::NoOverheadHangs) => {
            if let Some(hold) = session.hold.as_mut() {
                hold.overhead = false;
            }
            session
                .notes
                .push(SessionNote::new("Hang with bent arms and engaged shoulders, never dead-hang"));
            session.modifications.push(Modification::NoOverheadHangs);
        }
        SessionType::Fitness if !session.has_modification(Modification::NeutralPullGrip) => {
            session.pull_grip = Some(PullGrip::Neutral);
            session.modifications.push(Modification::NeutralPullGrip);
        }
        _ => {}
    }
}

/// No external load; fitness becomes core stability
fn protect_back(session: &mut Session) {
    if session.loaded && !session.has_modification(Modification::NoWeightedLoad) {
        session.loaded = false;
        session.modifications.push(Modification::NoWeightedLoad);
    }

    if session.session_type == SessionType::Fitness
        && !session.has_modification(Modification::CoreStabilityRedirect)
    {
        session.name = "Core stability circuit".to_string();
        session.notes.retain(|n| n.text != LOADED_CIRCUIT_NOTE);
        session.notes.insert(
            0,
            SessionNote::new("Dead bugs, bird dogs, side planks and hollow holds; no loaded exercises"),
        );
        session.modifications.push(Modification::CoreStabilityRedirect);
    }
}
