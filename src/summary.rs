// Summary statistics and feedback highlights
//
// Turns per-vector metric summaries into the small set of facts a feedback
// consumer acts on: which comparison vector scored worst, and which vectors
// are statistical outliers relative to the rest of the body.

use serde::{Deserialize, Serialize};

use crate::config::EvaluationConfig;
use crate::metrics::MetricSummary;
use crate::pose::{arithmetic_mean, std_dev};

/// Mean and population standard deviation of a score series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// `None` for an empty series.
pub fn summary_stats(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }
    Some(SummaryStats {
        mean: arithmetic_mean(values),
        std_dev: std_dev(values),
    })
}

/// Per-metric feedback highlights derived from a summary's per-vector
/// scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHighlights {
    /// The comparison vector with the worst mean score
    pub worst_vector: Option<String>,
    /// Vectors scoring more than `outlier_std_devs` standard deviations
    /// worse than the per-vector mean
    pub outlier_vectors: Vec<String>,
}

/// Pick out the worst and outlier comparison vectors of one metric summary.
///
/// "Worse" respects the metric's score polarity. Vectors without a score
/// (no finite frames) are ignored.
pub fn vector_highlights(summary: &MetricSummary, config: &EvaluationConfig) -> VectorHighlights {
    let higher_is_better = summary.metric.higher_is_better();
    let scored: Vec<(&String, f64)> = summary
        .per_vector_scores
        .iter()
        .filter_map(|(name, score)| score.map(|s| (name, s)))
        .collect();

    let worst_vector = scored
        .iter()
        .reduce(|worst, candidate| {
            let candidate_is_worse = if higher_is_better {
                candidate.1 < worst.1
            } else {
                candidate.1 > worst.1
            };
            if candidate_is_worse {
                candidate
            } else {
                worst
            }
        })
        .map(|(name, _)| (*name).clone());

    let outlier_vectors = match summary_stats(&scored.iter().map(|(_, s)| *s).collect::<Vec<f64>>())
    {
        Some(stats) if stats.std_dev > 0.0 => scored
            .iter()
            .filter(|(_, score)| {
                let deviations = if higher_is_better {
                    (stats.mean - score) / stats.std_dev
                } else {
                    (score - stats.mean) / stats.std_dev
                };
                deviations > config.outlier_std_devs
            })
            .map(|(name, _)| (*name).clone())
            .collect(),
        _ => Vec::new(),
    };

    VectorHighlights {
        worst_vector,
        outlier_vectors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LiveMetricKind;

    fn summary_with_scores(
        metric: LiveMetricKind,
        scores: &[(&str, Option<f64>)],
    ) -> MetricSummary {
        MetricSummary {
            metric,
            overall_score: 0.0,
            min_possible_score: 0.0,
            max_possible_score: 5.0,
            per_vector_scores: scores
                .iter()
                .map(|(name, score)| (name.to_string(), *score))
                .collect(),
        }
    }

    #[test]
    fn stats_of_an_empty_series_are_unavailable() {
        assert!(summary_stats(&[]).is_none());
    }

    #[test]
    fn stats_report_mean_and_population_deviation() {
        let stats = summary_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn worst_vector_respects_score_polarity() {
        let config = EvaluationConfig::default();
        // Higher is better: the lowest score is worst.
        let similarity = summary_with_scores(
            LiveMetricKind::UnitVector,
            &[("torso", Some(4.8)), ("left_arm", Some(2.1)), ("right_arm", Some(4.5))],
        );
        assert_eq!(
            vector_highlights(&similarity, &config).worst_vector,
            Some("left_arm".to_string())
        );

        // Lower is better: the highest score is worst.
        let dissimilarity = summary_with_scores(
            LiveMetricKind::Blended,
            &[("torso", Some(0.05)), ("left_arm", Some(0.4)), ("right_arm", Some(0.1))],
        );
        assert_eq!(
            vector_highlights(&dissimilarity, &config).worst_vector,
            Some("left_arm".to_string())
        );
    }

    #[test]
    fn unscored_vectors_are_ignored() {
        let config = EvaluationConfig::default();
        let summary = summary_with_scores(
            LiveMetricKind::UnitVector,
            &[("torso", None), ("left_arm", Some(3.0))],
        );
        let highlights = vector_highlights(&summary, &config);
        assert_eq!(highlights.worst_vector, Some("left_arm".to_string()));
    }

    #[test]
    fn outliers_are_flagged_beyond_the_deviation_threshold() {
        let config = EvaluationConfig {
            outlier_std_devs: 1.5,
            ..Default::default()
        };
        // Seven vectors near 4.8, one at 1.0: the low one is far beyond
        // 1.5 standard deviations below the mean.
        let scores: Vec<(String, Option<f64>)> = (0..7)
            .map(|i| (format!("v{}", i), Some(4.8)))
            .chain(std::iter::once(("bad".to_string(), Some(1.0))))
            .collect();
        let summary = MetricSummary {
            metric: LiveMetricKind::UnitVector,
            overall_score: 0.0,
            min_possible_score: 0.0,
            max_possible_score: 5.0,
            per_vector_scores: scores,
        };
        let highlights = vector_highlights(&summary, &config);
        assert_eq!(highlights.outlier_vectors, vec!["bad".to_string()]);
    }

    #[test]
    fn uniform_scores_have_no_outliers() {
        let config = EvaluationConfig::default();
        let summary = summary_with_scores(
            LiveMetricKind::UnitVector,
            &[("a", Some(3.0)), ("b", Some(3.0)), ("c", Some(3.0))],
        );
        let highlights = vector_highlights(&summary, &config);
        assert!(highlights.outlier_vectors.is_empty());
    }
}
