//! Metric normalization
//!
//! This module turns raw measurements into five body-weight-relative ratios and
//! rescales each into a 0-100 score using fixed calibration bounds.
//! - Ratios outside the bounds clamp to 0 or 100
//! - Weights are constants and sum to exactly 1.0

use crate::types::{MetricKind, NormalizedMetric, RawMeasurement};

/// Calibration range mapped onto 0-100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBounds {
    pub low: f64,
    pub high: f64,
}

impl MetricKind {
    /// Weight of this metric in the composite score
    pub fn weight(&self) -> f64 {
        match self {
            MetricKind::FingerStrength => 0.45,
            MetricKind::PullUps => 0.20,
            MetricKind::PushUps => 0.10,
            MetricKind::Core => 0.15,
            MetricKind::Flexibility => 0.10,
        }
    }

    pub fn bounds(&self) -> CalibrationBounds {
        let (low, high) = match self {
            MetricKind::FingerStrength => (1.0, 2.5),
            MetricKind::PullUps => (0.2, 1.0),
            MetricKind::PushUps => (0.3, 1.2),
            MetricKind::Core => (0.2, 0.8),
            MetricKind::Flexibility => (0.8, 1.5),
        };
        CalibrationBounds { low, high }
    }
}

/// Normalizer for converting measurements to scored metrics
pub struct Normalizer;

impl Normalizer {
    /// Normalize a validated measurement. Metrics come back in canonical order.
    pub fn normalize(measurement: &RawMeasurement) -> Vec<NormalizedMetric> {
        MetricKind::ALL
            .iter()
            .map(|&kind| {
                let raw_ratio = raw_ratio(kind, measurement);
                NormalizedMetric {
                    kind,
                    raw_ratio,
                    score: rescale(raw_ratio, kind.bounds()),
                    weight: kind.weight(),
                }
            })
            .collect()
    }
}

/// Body-weight (or height) relative ratio for one metric
fn raw_ratio(kind: MetricKind, m: &RawMeasurement) -> f64 {
    match kind {
        // Total hang load relative to body weight
        MetricKind::FingerStrength => (m.added_weight_kg + m.body_weight_kg) / m.body_weight_kg,
        MetricKind::PullUps => m.max_pull_ups as f64 / m.body_weight_kg,
        MetricKind::PushUps => m.max_push_ups as f64 / m.body_weight_kg,
        MetricKind::Core => m.max_toe_to_bar as f64 / m.body_weight_kg,
        MetricKind::Flexibility => m.leg_spread_cm / m.height_cm,
    }
}

/// Linear rescale of a ratio into 0-100
fn rescale(ratio: f64, bounds: CalibrationBounds) -> f64 {
    (((ratio - bounds.low) / (bounds.high - bounds.low)) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::Grade;

    fn make_test_measurement() -> RawMeasurement {
        RawMeasurement {
            body_weight_kg: 70.0,
            height_cm: 175.0,
            added_weight_kg: 20.0,
            max_pull_ups: 12,
            max_push_ups: 20,
            max_toe_to_bar: 8,
            leg_spread_cm: 140.0,
            eighty_percent_grade: Grade::new(4),
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = MetricKind::ALL.iter().map(|k| k.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reference_measurement_ratios() {
        let metrics = Normalizer::normalize(&make_test_measurement());
        assert_eq!(metrics.len(), 5);

        let finger = &metrics[0];
        assert_eq!(finger.kind, MetricKind::FingerStrength);
        assert!((finger.raw_ratio - 90.0 / 70.0).abs() < 1e-9);
        // (1.2857 - 1.0) / 1.5 * 100 = 19.05
        assert!((finger.score - 19.047_619).abs() < 1e-3);

        let pull = &metrics[1];
        assert!((pull.raw_ratio - 12.0 / 70.0).abs() < 1e-9);
        assert_eq!(pull.score, 0.0);

        // 140 / 175 = 0.8 sits exactly on the lower bound
        assert_eq!(metrics[4].score, 0.0);
    }

    #[test]
    fn test_scores_clamp_high() {
        let mut measurement = make_test_measurement();
        measurement.added_weight_kg = 140.0;
        measurement.leg_spread_cm = 300.0;
        let metrics = Normalizer::normalize(&measurement);
        assert_eq!(metrics[0].score, 100.0);
        assert_eq!(metrics[4].score, 100.0);
    }

    #[test]
    fn test_assisted_hang_clamps_low() {
        let mut measurement = make_test_measurement();
        measurement.added_weight_kg = -20.0;
        let metrics = Normalizer::normalize(&measurement);
        assert!(metrics[0].raw_ratio < 1.0);
        assert_eq!(metrics[0].score, 0.0);
    }
}
