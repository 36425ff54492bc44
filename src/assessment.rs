//! Assessment scoring
//!
//! This module derives the assessment outcome from normalized metrics:
//! - Composite score (weighted sum of scores / 100)
//! - Predicted grade via the threshold table
//! - Confidence from agreement with the self-reported 80% grade
//! - Strength/weakness ranking and recommendations

use crate::error::CoachError;
use crate::grades::{Grade, GradeThresholdTable, ReferenceGrades};
use crate::normalizer::Normalizer;
use crate::types::{AssessmentResult, Confidence, MetricKind, NormalizedMetric, RawMeasurement};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Metrics scoring below this are counted as weaknesses
pub const DEFAULT_WEAKNESS_THRESHOLD: f64 = 50.0;

/// Scorer for turning measurements into assessment results
#[derive(Debug, Clone)]
pub struct AssessmentScorer {
    table: GradeThresholdTable,
    weakness_threshold: f64,
}

impl Default for AssessmentScorer {
    fn default() -> Self {
        Self::new(GradeThresholdTable::standard(), DEFAULT_WEAKNESS_THRESHOLD)
    }
}

impl AssessmentScorer {
    pub fn new(table: GradeThresholdTable, weakness_threshold: f64) -> Self {
        Self {
            table,
            weakness_threshold,
        }
    }

    pub fn table(&self) -> &GradeThresholdTable {
        &self.table
    }

    /// Score a measurement. Fails without partial output on invalid input.
    pub fn score(
        &self,
        measurement: &RawMeasurement,
        assessed_at: DateTime<Utc>,
    ) -> Result<AssessmentResult, CoachError> {
        measurement.validate()?;

        let metrics = Normalizer::normalize(measurement);
        let composite_score = composite_score(&metrics);
        let predicted_grade = self.table.lookup(composite_score);
        let confidence = grade_confidence(predicted_grade, measurement.eighty_percent_grade);
        let ranking = rank_metrics(&metrics);

        let weaknesses: Vec<MetricKind> = ranking
            .iter()
            .rev()
            .filter(|m| m.score < self.weakness_threshold)
            .map(|m| m.kind)
            .collect();

        let strongest_area = ranking[0].kind;
        let weakest_area = ranking[ranking.len() - 1].kind;
        let secondary_focus = ranking[ranking.len() - 2].kind;

        let recommendations = build_recommendations(&weaknesses, weakest_area, secondary_focus);

        tracing::debug!(
            composite = composite_score,
            grade = %predicted_grade,
            confidence = confidence.as_str(),
            "scored assessment"
        );

        Ok(AssessmentResult {
            id: Uuid::new_v4(),
            assessed_at,
            measurements: measurement.clone(),
            metrics,
            composite_score,
            predicted_grade,
            confidence,
            strongest_area,
            weakest_area,
            secondary_focus,
            weaknesses,
            recommendations,
            reference_grades: ReferenceGrades::from_eighty_percent(
                measurement.eighty_percent_grade,
            ),
        })
    }
}

/// Weighted sum of score/100 across metrics
pub fn composite_score(metrics: &[NormalizedMetric]) -> f64 {
    metrics.iter().map(|m| m.weight * (m.score / 100.0)).sum()
}

/// Agreement between predicted and self-reported grade
pub fn grade_confidence(predicted: Grade, reported: Grade) -> Confidence {
    match predicted.distance(reported) {
        0..=1 => Confidence::High,
        2 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

/// Metrics sorted by score, strongest first. Ties keep canonical order.
fn rank_metrics(metrics: &[NormalizedMetric]) -> Vec<&NormalizedMetric> {
    let mut ranked: Vec<&NormalizedMetric> = metrics.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

fn build_recommendations(
    weaknesses: &[MetricKind],
    weakest: MetricKind,
    secondary: MetricKind,
) -> Vec<String> {
    let mut focus: Vec<MetricKind> = vec![weakest, secondary];
    for kind in weaknesses {
        if !focus.contains(kind) {
            focus.push(*kind);
        }
    }

    focus.into_iter().map(recommendation_for).map(String::from).collect()
}

fn recommendation_for(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::FingerStrength => {
            "Prioritise structured max hangs twice a week; finger strength carries the most weight"
        }
        MetricKind::PullUps => {
            "Add weighted or tempo pull-ups after climbing sessions to build pulling power"
        }
        MetricKind::PushUps => {
            "Include push-ups and dips as antagonist work to balance pulling volume"
        }
        MetricKind::Core => {
            "Train toes-to-bar and front-lever progressions to keep feet on steep terrain"
        }
        MetricKind::Flexibility => {
            "Stretch hips and hamstrings daily to reach high steps and wide stems"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_measurement() -> RawMeasurement {
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

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_reference_example_is_reproducible() {
        let scorer = AssessmentScorer::default();
        let first = scorer.score(&make_measurement(), at()).unwrap();
        let second = scorer.score(&make_measurement(), at()).unwrap();

        // Only the finger metric scores: 0.45 * 0.1905
        let expected = 0.45 * ((90.0 / 70.0 - 1.0) / 1.5);
        assert!((first.composite_score - expected).abs() < 1e-9);
        assert_eq!(first.composite_score, second.composite_score);
        assert_eq!(first.predicted_grade, Grade::new(4));
        assert_eq!(first.confidence, Confidence::High);
        assert_eq!(first.strongest_area, MetricKind::FingerStrength);
    }

    #[test]
    fn test_ties_rank_in_canonical_order() {
        let result = AssessmentScorer::default()
            .score(&make_measurement(), at())
            .unwrap();
        // Pull-ups through flexibility all score 0
        assert_eq!(result.weakest_area, MetricKind::Flexibility);
        assert_eq!(result.secondary_focus, MetricKind::Core);
        assert_eq!(result.weaknesses.len(), 5);
        assert_eq!(result.weaknesses[0], MetricKind::Flexibility);
        assert_eq!(result.recommendations.len(), 5);
    }

    #[test]
    fn test_composite_stays_in_range() {
        let scorer = AssessmentScorer::default();
        for (added, pulls, spread) in [(-60.0, 0, 0.0), (0.0, 5, 100.0), (200.0, 90, 400.0)] {
            let mut m = make_measurement();
            m.added_weight_kg = added;
            m.max_pull_ups = pulls;
            m.leg_spread_cm = spread;
            let result = scorer.score(&m, at()).unwrap();
            assert!((0.0..=1.5).contains(&result.composite_score));
        }
    }

    #[test]
    fn test_strong_climber_predicts_higher_grade() {
        let mut m = make_measurement();
        m.added_weight_kg = 60.0; // ratio 1.857 -> 57
        m.max_pull_ups = 60; // 0.857 -> 82
        m.max_push_ups = 70; // 1.0 -> 78
        m.max_toe_to_bar = 50; // 0.714 -> 86
        m.leg_spread_cm = 245.0; // 1.4 -> 86
        m.eighty_percent_grade = Grade::new(6);
        let result = AssessmentScorer::default().score(&m, at()).unwrap();

        assert!(result.composite_score > 0.65);
        assert!(result.predicted_grade >= Grade::new(5));
        assert_eq!(result.weakest_area, MetricKind::FingerStrength);
        assert!(result.weaknesses.is_empty());
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(grade_confidence(Grade::new(5), Grade::new(4)), Confidence::High);
        assert_eq!(grade_confidence(Grade::new(5), Grade::new(7)), Confidence::Medium);
        assert_eq!(grade_confidence(Grade::new(4), Grade::new(8)), Confidence::Low);
    }

    #[test]
    fn test_invalid_height_fails_fast() {
        let mut m = make_measurement();
        m.height_cm = -1.0;
        let err = AssessmentScorer::default().score(&m, at()).unwrap_err();
        assert!(matches!(err, CoachError::ValidationError { ref field, .. } if field == "height_cm"));
    }
}
