//! Assessment history
//!
//! This module keeps the append-only record of a climber's assessments and
//! derives progress between them:
//! - Composite score delta
//! - Predicted grade delta
//! - Per-metric score deltas
//!
//! It also holds per-session feedback used for retention tracking.

use crate::error::CoachError;
use crate::types::{AssessmentResult, MetricKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Change in one metric between two assessments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub kind: MetricKind,
    pub previous_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

/// Change between the two latest assessments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDelta {
    pub previous_assessed_at: DateTime<Utc>,
    pub current_assessed_at: DateTime<Utc>,
    pub composite_delta: f64,
    /// Positive when the predicted grade went up
    pub grade_delta: i32,
    pub metric_deltas: Vec<MetricDelta>,
}

impl ProgressDelta {
    /// Metrics that improved, largest gain first
    pub fn improved(&self) -> Vec<MetricKind> {
        let mut gains: Vec<&MetricDelta> = self.metric_deltas.iter().filter(|d| d.delta > 0.0).collect();
        gains.sort_by(|a, b| b.delta.total_cmp(&a.delta));
        gains.into_iter().map(|d| d.kind).collect()
    }
}

/// Append-only list of assessments, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentHistory {
    records: Vec<AssessmentResult>,
}

impl AssessmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an assessment. Records must arrive in time order.
    pub fn record(&mut self, assessment: AssessmentResult) -> Result<(), CoachError> {
        if let Some(current) = self.current() {
            if assessment.assessed_at < current.assessed_at {
                return Err(CoachError::validation(
                    "assessed_at",
                    format!(
                        "{} is earlier than the latest assessment at {}",
                        assessment.assessed_at, current.assessed_at
                    ),
                ));
            }
        }
        self.records.push(assessment);
        Ok(())
    }

    /// Latest assessment
    pub fn current(&self) -> Option<&AssessmentResult> {
        self.records.last()
    }

    pub fn records(&self) -> &[AssessmentResult] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Progress between the two latest assessments, if there are two
    pub fn progress(&self) -> Option<ProgressDelta> {
        let [previous, current] = self.records.get(self.records.len().checked_sub(2)?..)? else {
            return None;
        };

        let metric_deltas = MetricKind::ALL
            .iter()
            .filter_map(|kind| {
                let before = previous.metric(*kind)?;
                let after = current.metric(*kind)?;
                Some(MetricDelta {
                    kind: *kind,
                    previous_score: before.score,
                    current_score: after.score,
                    delta: after.score - before.score,
                })
            })
            .collect();

        Some(ProgressDelta {
            previous_assessed_at: previous.assessed_at,
            current_assessed_at: current.assessed_at,
            composite_delta: current.composite_score - previous.composite_score,
            grade_delta: current.predicted_grade.ordinal() - previous.predicted_grade.ordinal(),
            metric_deltas,
        })
    }

    pub fn to_json(&self) -> Result<String, CoachError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CoachError> {
        let history: AssessmentHistory = serde_json::from_str(json)?;
        if history
            .records
            .windows(2)
            .any(|pair| pair[1].assessed_at < pair[0].assessed_at)
        {
            return Err(CoachError::validation(
                "records",
                "assessments are not in time order",
            ));
        }
        Ok(history)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CoachError> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| CoachError::PersistenceError(format!("{}: {e}", path.as_ref().display())))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoachError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CoachError::PersistenceError(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json(&json)
    }
}

/// Post-session feedback from the climber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFeedback {
    pub completed: bool,
    /// 1 (hated it) to 5 (loved it)
    pub satisfaction: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SessionFeedback {
    /// Retention score for this one session: 70 + satisfaction x 6 when
    /// completed, otherwise 0.
    pub fn consistency_score(&self) -> f64 {
        if self.completed {
            70.0 + f64::from(self.satisfaction.min(5)) * 6.0
        } else {
            0.0
        }
    }
}
