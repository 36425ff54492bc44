//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.

use crate::assessment::DEFAULT_WEAKNESS_THRESHOLD;
use crate::error::CoachError;
use crate::planner::DEFAULT_MAX_ACTIVE_DAYS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the coaching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Narration call timeout in seconds
    pub generation_timeout_secs: u64,
    /// Upper bound on training days per week (1-5)
    pub max_active_days: usize,
    /// Metric scores below this count as weaknesses
    pub weakness_threshold: f64,
    /// Instance id stamped on encoded output
    pub producer_instance_id: Option<String>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 45,
            max_active_days: DEFAULT_MAX_ACTIVE_DAYS,
            weakness_threshold: DEFAULT_WEAKNESS_THRESHOLD,
            producer_instance_id: None,
        }
    }
}

impl CoachConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CoachError> {
        let config: CoachConfig =
            toml::from_str(content).map_err(|e| CoachError::ConfigFileError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, CoachError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoachError::ConfigFileError(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, CoachError> {
        toml::to_string_pretty(self).map_err(|e| CoachError::ConfigFileError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), CoachError> {
        if self.generation_timeout_secs == 0 {
            return Err(CoachError::configuration(
                "generation_timeout_secs",
                "must be at least 1 second",
            ));
        }
        if !(1..=DEFAULT_MAX_ACTIVE_DAYS).contains(&self.max_active_days) {
            return Err(CoachError::configuration(
                "max_active_days",
                format!("must be between 1 and {DEFAULT_MAX_ACTIVE_DAYS}"),
            ));
        }
        if !self.weakness_threshold.is_finite() || !(0.0..=100.0).contains(&self.weakness_threshold)
        {
            return Err(CoachError::configuration(
                "weakness_threshold",
                "must be a score between 0 and 100",
            ));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = CoachConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoachConfig::default());
        assert_eq!(config.generation_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_partial_override() {
        let config = CoachConfig::from_toml_str(
            "generation_timeout_secs = 10\nproducer_instance_id = \"gym-kiosk-1\"\n",
        )
        .unwrap();
        assert_eq!(config.generation_timeout_secs, 10);
        assert_eq!(config.max_active_days, 5);
        assert_eq!(config.producer_instance_id.as_deref(), Some("gym-kiosk-1"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = CoachConfig::from_toml_str("generation_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, CoachError::ConfigurationError { ref field, .. } if field == "generation_timeout_secs"));
    }

    #[test]
    fn test_rejects_too_many_days() {
        let config = CoachConfig {
            max_active_days: 6,
            ..CoachConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = CoachConfig::from_toml_str("max_active_days = \"five\"").unwrap_err();
        assert!(matches!(err, CoachError::ConfigFileError(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CoachConfig {
            weakness_threshold: 40.0,
            ..CoachConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(CoachConfig::from_toml_str(&text).unwrap(), config);
    }
}
