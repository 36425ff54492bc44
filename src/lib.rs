//! Crux - climbing assessment scoring and periodized program engine
//!
//! Crux turns fitness test measurements into a predicted bouldering grade and
//! a validated six-week training program through a deterministic pipeline:
//! assessment scoring → periodization planning → injury/equipment adaptation
//! → review gating → optional narration.
//!
//! ## Modules
//!
//! - **Assessment**: normalize measurements, composite score, predicted grade
//! - **Planning**: constraint-checked calendar with progressive, deload and
//!   assessment phases
//! - **Safety**: injury adaptation and the coach review gate
//! - **Narration**: timeout-bounded descriptive text with a deterministic fallback

pub mod adapters;
pub mod assessment;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod constraints;
pub mod encoder;
pub mod error;
pub mod generation;
pub mod grades;
pub mod history;
pub mod normalizer;
pub mod pipeline;
pub mod planner;
pub mod review;
pub mod storage;
pub mod types;

pub use config::CoachConfig;
pub use error::CoachError;
pub use grades::{Grade, GradeThresholdTable};
pub use pipeline::{plan_program, score_assessment, CoachEngine};

// Collaborator exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use generation::{NarrationProvider, NarrationRequest};
pub use storage::{InMemoryStorage, Storage};

/// Crux version embedded in all encoded output
pub const CRUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for encoded output
pub const PRODUCER_NAME: &str = "crux";
