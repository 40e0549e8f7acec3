// 3D joint-angle similarity metric
//
// Compares the 7 named joint angles between the learner's and the
// reference's 3D frames. Each comparison scores
// 1 - |angle difference| / range_of_motion, so a difference equal to the
// joint's full range of motion scores 0 and larger differences go negative
// rather than saturating. The frame's overall score is the harmonic mean of
// the comparison scores, which a single badly-off joint drags down hard.

use serde::{Deserialize, Serialize};

use crate::pose::{
    harmonic_mean, harmonic_mean_filtered, inner_angle_from_frame, mean_filtered, AngleComparison,
    Pose3D, ANGLE_COMPARISONS,
};

use super::{LiveMetricKind, MetricSummary};

/// One joint-angle comparison's result for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleComparisonScore {
    pub name: String,
    /// Learner's inner angle, radians
    pub user_angle: f64,
    /// Reference's inner angle, radians
    pub ref_angle: f64,
    /// Signed difference user - reference, radians
    pub angle_difference: f64,
    /// 1 at identical angles, 0 at a full range-of-motion difference,
    /// negative beyond that
    pub score: f64,
}

/// One frame's joint-angle scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Angle3dFrame {
    pub overall_score: f64,
    /// Score per comparison, in `ANGLE_COMPARISONS` order
    pub comparison_scores: Vec<AngleComparisonScore>,
}

/// Score one joint-angle comparison between two 3D frames.
pub fn compare_single(
    ref_pose: &Pose3D,
    user_pose: &Pose3D,
    comparison: &AngleComparison,
) -> AngleComparisonScore {
    let user_angle = inner_angle_from_frame(user_pose, comparison.vec1, comparison.vec2);
    let ref_angle = inner_angle_from_frame(ref_pose, comparison.vec1, comparison.vec2);
    let angle_difference = user_angle - ref_angle;
    AngleComparisonScore {
        name: comparison.name.to_string(),
        user_angle,
        ref_angle,
        angle_difference,
        score: 1.0 - angle_difference.abs() / comparison.range_of_motion,
    }
}

/// Score one learner frame against its reference frame.
pub fn compute(ref_pose: &Pose3D, user_pose: &Pose3D) -> Angle3dFrame {
    let comparison_scores: Vec<AngleComparisonScore> = ANGLE_COMPARISONS
        .iter()
        .map(|cmp| compare_single(ref_pose, user_pose, cmp))
        .collect();
    let scores: Vec<f64> = comparison_scores.iter().map(|c| c.score).collect();
    Angle3dFrame {
        overall_score: harmonic_mean(&scores),
        comparison_scores,
    }
}

/// Reduce a frame history to per-attempt means.
///
/// The overall score is the harmonic mean of frame overalls (NaN frames
/// filtered); per-joint scores are arithmetic means.
pub fn summarize<'a>(frames: impl Iterator<Item = &'a Angle3dFrame>) -> Option<MetricSummary> {
    let frames: Vec<&Angle3dFrame> = frames.collect();
    let overall_score = harmonic_mean_filtered(frames.iter().map(|f| f.overall_score))?;
    let per_vector_scores = ANGLE_COMPARISONS
        .iter()
        .enumerate()
        .map(|(i, cmp)| {
            (
                cmp.name.to_string(),
                mean_filtered(frames.iter().map(|f| f.comparison_scores[i].score)),
            )
        })
        .collect();
    Some(MetricSummary {
        metric: LiveMetricKind::Angle3d,
        overall_score,
        min_possible_score: 0.0,
        max_possible_score: 1.0,
        per_vector_scores,
    })
}
