//! Error types for Crux

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during scoring, planning or generation
#[derive(Debug, Error)]
pub enum CoachError {
    #[error("Invalid measurement field `{field}`: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Invalid preferences field `{field}`: {reason}")]
    ConfigurationError { field: String, reason: String },

    #[error("Invalid grade token: {0}")]
    InvalidGrade(String),

    #[error("Invalid grade threshold table: {0}")]
    GradeTableError(String),

    #[error("Narration timed out after {0:?}")]
    GenerationTimeoutError(Duration),

    #[error("Narration output rejected: {0}")]
    GenerationParseError(String),

    #[error("Narration provider failed: {0}")]
    GenerationError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFileError(String),
}

impl CoachError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        CoachError::ValidationError {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(field: &str, reason: impl Into<String>) -> Self {
        CoachError::ConfigurationError {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised at the narration boundary. These never reach the
    /// caller of `generate_program`.
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            CoachError::GenerationTimeoutError(_)
                | CoachError::GenerationParseError(_)
                | CoachError::GenerationError(_)
        )
    }
}
