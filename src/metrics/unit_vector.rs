// Unit-vector similarity metric
//
// Direction-only comparison of the 8 upper-body comparison vectors. Each
// segment is normalized to a unit vector in pixel space, so the metric is
// insensitive to subject size and limb length and only penalizes pointing a
// segment the wrong way. The Euclidean distance between two unit vectors
// lies in [0, 2]; it is mapped linearly onto a [5, 0] score (5 = identical
// direction).

use serde::{Deserialize, Serialize};

use crate::pose::{
    lerp, magnitude_2d, mean_filtered, normalized_segment_2d, Pose2D, COMPARISON_VECTORS,
    COMPARISON_VECTOR_COUNT, COMPARISON_VECTOR_NAMES,
};

use super::{LiveMetricKind, MetricSummary};

pub const UNIT_VECTOR_WORST_SCORE: f64 = 0.0;
pub const UNIT_VECTOR_BEST_SCORE: f64 = 5.0;

/// One frame's unit-vector scores, already mapped onto [0, 5].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitVectorFrame {
    pub overall_score: f64,
    /// Score per comparison vector, in `COMPARISON_VECTORS` order
    pub vector_scores: [f64; COMPARISON_VECTOR_COUNT],
}

/// Score one learner frame against its reference frame.
///
/// A degenerate (zero-length) segment has no direction; its distance is
/// taken as 0 so a single collapsed segment does not poison the frame.
pub fn compute(ref_pose: &Pose2D, user_pose: &Pose2D) -> UnitVectorFrame {
    let mut vector_scores = [0.0; COMPARISON_VECTOR_COUNT];
    for (slot, (src, dst)) in vector_scores.iter_mut().zip(COMPARISON_VECTORS) {
        let ref_unit = normalized_segment_2d(ref_pose, src, dst);
        let user_unit = normalized_segment_2d(user_pose, src, dst);
        let mut dissimilarity =
            magnitude_2d([ref_unit[0] - user_unit[0], ref_unit[1] - user_unit[1]]);
        if dissimilarity.is_nan() {
            dissimilarity = 0.0;
        }
        *slot = lerp(
            dissimilarity,
            0.0,
            2.0,
            UNIT_VECTOR_BEST_SCORE,
            UNIT_VECTOR_WORST_SCORE,
            false,
        );
    }
    UnitVectorFrame {
        overall_score: vector_scores.iter().sum::<f64>() / COMPARISON_VECTOR_COUNT as f64,
        vector_scores,
    }
}

/// Reduce a frame history to per-attempt means.
pub fn summarize<'a>(frames: impl Iterator<Item = &'a UnitVectorFrame>) -> Option<MetricSummary> {
    let frames: Vec<&UnitVectorFrame> = frames.collect();
    let overall_score = mean_filtered(frames.iter().map(|f| f.overall_score))?;
    let per_vector_scores = COMPARISON_VECTOR_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            (
                name.clone(),
                mean_filtered(frames.iter().map(|f| f.vector_scores[i])),
            )
        })
        .collect();
    Some(MetricSummary {
        metric: LiveMetricKind::UnitVector,
        overall_score,
        min_possible_score: UNIT_VECTOR_WORST_SCORE,
        max_possible_score: UNIT_VECTOR_BEST_SCORE,
        per_vector_scores,
    })
}
