// ============================================================================
// Tala Core - Scoring
// File: crates/tala-core/src/domain/scoring.rs
// Description: Dimension scoring for completed assessment instances
// ============================================================================

use std::collections::BTreeMap;

use tala_shared::constants::{GENERAL_DIMENSION, PERCENTILE_SCALE};

use super::assessment::{Question, QuestionKind};
use super::instance::Response;

/// Raw dimension averages plus their percentile projections.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub dimensions: BTreeMap<String, f64>,
    pub percentiles: BTreeMap<String, f64>,
}

/// Averages weighted answer values per dimension. Questions without a
/// dimension fall into the general bucket, missing numeric values count
/// as zero, and reverse-scored Likert items are flipped on their scale
/// before weighting. Percentiles project the average onto a 7-point
/// scale clamped to 0..=100.
pub fn score_responses(questions: &[Question], responses: &[Response]) -> ScoreBreakdown {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();

    for response in responses {
        let Some(question) = questions.iter().find(|q| q.id == response.question_id) else {
            continue;
        };

        let dimension = if question.dimension.is_empty() {
            GENERAL_DIMENSION.to_string()
        } else {
            question.dimension.clone()
        };

        let mut value = f64::from(response.numeric_value.unwrap_or(0));
        if question.reverse_scored {
            match question.kind {
                QuestionKind::Likert5 => value = 6.0 - value,
                QuestionKind::Likert7 => value = 8.0 - value,
                _ => {}
            }
        }
        value *= question.weight;

        *sums.entry(dimension.clone()).or_insert(0.0) += value;
        *counts.entry(dimension).or_insert(0) += 1;
    }

    let mut dimensions = BTreeMap::new();
    for (dimension, sum) in sums {
        let count = counts.get(&dimension).copied().unwrap_or(0);
        if count > 0 {
            dimensions.insert(dimension, sum / f64::from(count));
        }
    }

    let percentiles = dimensions
        .iter()
        .map(|(dimension, score)| {
            let pct = (score / PERCENTILE_SCALE) * 100.0;
            (dimension.clone(), pct.clamp(0.0, 100.0))
        })
        .collect();

    ScoreBreakdown {
        dimensions,
        percentiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn question(kind: QuestionKind, dimension: &str, reverse: bool, weight: f64) -> Question {
        let mut q = Question::new(
            Uuid::new_v4(),
            "q".into(),
            kind,
            0,
            dimension.to_string(),
        )
        .unwrap();
        q.reverse_scored = reverse;
        q.weight = weight;
        q
    }

    fn answer(question: &Question, value: Option<i32>) -> Response {
        Response::new(Uuid::new_v4(), question.id, value, String::new(), None)
    }

    #[test]
    fn test_averages_per_dimension() {
        let q1 = question(QuestionKind::Likert5, "openness", false, 1.0);
        let q2 = question(QuestionKind::Likert5, "openness", false, 1.0);
        let q3 = question(QuestionKind::Likert5, "rigor", false, 1.0);
        let responses = vec![answer(&q1, Some(4)), answer(&q2, Some(2)), answer(&q3, Some(5))];

        let breakdown = score_responses(&[q1, q2, q3], &responses);
        assert_eq!(breakdown.dimensions.get("openness"), Some(&3.0));
        assert_eq!(breakdown.dimensions.get("rigor"), Some(&5.0));
    }

    #[test]
    fn test_reverse_scoring_flips_scale() {
        let q5 = question(QuestionKind::Likert5, "d", true, 1.0);
        let r5 = vec![answer(&q5, Some(2))];
        let breakdown = score_responses(&[q5], &r5);
        assert_eq!(breakdown.dimensions.get("d"), Some(&4.0));

        let q7 = question(QuestionKind::Likert7, "d", true, 1.0);
        let r7 = vec![answer(&q7, Some(2))];
        let breakdown = score_responses(&[q7], &r7);
        assert_eq!(breakdown.dimensions.get("d"), Some(&6.0));
    }

    #[test]
    fn test_weight_applied_after_reverse() {
        let q = question(QuestionKind::Likert5, "d", true, 2.0);
        let responses = vec![answer(&q, Some(1))];
        let breakdown = score_responses(&[q], &responses);
        // 6 - 1 = 5, then * 2
        assert_eq!(breakdown.dimensions.get("d"), Some(&10.0));
    }

    #[test]
    fn test_blank_dimension_goes_general() {
        let q = question(QuestionKind::Likert5, "", false, 1.0);
        let responses = vec![answer(&q, Some(3))];
        let breakdown = score_responses(&[q], &responses);
        assert_eq!(breakdown.dimensions.get(GENERAL_DIMENSION), Some(&3.0));
    }

    #[test]
    fn test_missing_value_counts_as_zero() {
        let q1 = question(QuestionKind::Likert5, "d", false, 1.0);
        let q2 = question(QuestionKind::Likert5, "d", false, 1.0);
        let responses = vec![answer(&q1, Some(4)), answer(&q2, None)];
        let breakdown = score_responses(&[q1, q2], &responses);
        assert_eq!(breakdown.dimensions.get("d"), Some(&2.0));
    }

    #[test]
    fn test_percentiles_clamped() {
        let high = question(QuestionKind::Likert7, "hi", false, 2.0);
        let low = question(QuestionKind::Likert5, "lo", false, 1.0);
        let responses = vec![answer(&high, Some(7)), answer(&low, Some(0))];
        let breakdown = score_responses(&[high, low], &responses);
        // 14 / 7 * 100 clamps at 100
        assert_eq!(breakdown.percentiles.get("hi"), Some(&100.0));
        assert_eq!(breakdown.percentiles.get("lo"), Some(&0.0));
    }

    #[test]
    fn test_orphan_responses_ignored() {
        let q = question(QuestionKind::Likert5, "d", false, 1.0);
        let stray = Response::new(Uuid::new_v4(), Uuid::new_v4(), Some(5), String::new(), None);
        let breakdown = score_responses(&[q], &[stray]);
        assert!(breakdown.dimensions.is_empty());
        assert!(breakdown.percentiles.is_empty());
    }
}
