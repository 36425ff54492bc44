//! Persistence seam
//!
//! The engine hands finished records to a `Storage` and moves on. A failed
//! save is logged and never fails the request.

use crate::error::CoachError;
use crate::types::{AssessmentResult, TrainingProgram};
use std::sync::Mutex;

/// Sink for finished assessments and programs
pub trait Storage: Send + Sync {
    /// Persist an assessment, returning its storage id
    fn save_assessment(&self, assessment: &AssessmentResult) -> Result<String, CoachError>;

    /// Persist a program, returning its storage id
    fn save_program(&self, program: &TrainingProgram) -> Result<String, CoachError>;
}

/// Storage that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

impl Storage for NullStorage {
    fn save_assessment(&self, assessment: &AssessmentResult) -> Result<String, CoachError> {
        Ok(assessment.id.to_string())
    }

    fn save_program(&self, program: &TrainingProgram) -> Result<String, CoachError> {
        Ok(program.id.to_string())
    }
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    assessments: Mutex<Vec<AssessmentResult>>,
    programs: Mutex<Vec<TrainingProgram>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assessments(&self) -> Vec<AssessmentResult> {
        self.assessments
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn programs(&self) -> Vec<TrainingProgram> {
        self.programs
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Storage for InMemoryStorage {
    fn save_assessment(&self, assessment: &AssessmentResult) -> Result<String, CoachError> {
        let mut guard = self
            .assessments
            .lock()
            .map_err(|_| CoachError::PersistenceError("assessment store poisoned".to_string()))?;
        guard.push(assessment.clone());
        Ok(assessment.id.to_string())
    }

    fn save_program(&self, program: &TrainingProgram) -> Result<String, CoachError> {
        let mut guard = self
            .programs
            .lock()
            .map_err(|_| CoachError::PersistenceError("program store poisoned".to_string()))?;
        guard.push(program.clone());
        Ok(program.id.to_string())
    }
}

/// Run a save, logging instead of propagating failure
pub(crate) fn save_or_warn(
    kind: &'static str,
    save: impl FnOnce() -> Result<String, CoachError>,
) -> Option<String> {
    match save() {
        Ok(id) => {
            tracing::debug!(kind, id = %id, "saved record");
            Some(id)
        }
        Err(error) => {
            tracing::warn!(kind, error = %error, "failed to save record, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_save_is_swallowed() {
        let id = save_or_warn("program", || {
            Err(CoachError::PersistenceError("disk full".to_string()))
        });
        assert_eq!(id, None);
    }

    #[test]
    fn test_successful_save_returns_id() {
        let id = save_or_warn("assessment", || Ok("a-1".to_string()));
        assert_eq!(id.as_deref(), Some("a-1"));
    }
}
