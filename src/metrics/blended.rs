// Blended angle/magnitude similarity metric
//
// Scores each comparison vector on [0, 1] (0 = identical) by blending two
// differentials:
// - magnitude: |refMag - adjUsrMag| / max(refMag, adjUsrMag), where the
//   learner's magnitude is rescaled into the reference's body scale
// - angle: inner angle between the two segments, as a fraction of pi
//
// A segment that is foreshortened toward the camera appears short in pixel
// space, and its 2D angle is unreliable exactly then. The blend weight ramps
// from magnitude-only scoring below `min_reliable_angle_magnitude_px` to
// angle-only scoring at `target_reliable_angle_magnitude_px`, taking the
// minimum reliability across the two subjects.

use serde::{Deserialize, Serialize};

use crate::config::EvaluationConfig;
use crate::pose::{
    inner_angle_2d, lerp, magnitude_2d, mean_filtered, scale_indicator_2d, segment_2d, Pose2D,
    COMPARISON_VECTORS, COMPARISON_VECTOR_COUNT, COMPARISON_VECTOR_NAMES,
};

use super::{LiveMetricKind, MetricSummary};

/// One comparison vector's blended score and its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendedVectorScore {
    /// Relative magnitude differential, [0, 1]
    pub magnitude_differential: f64,
    /// Angle differential as a fraction of pi, [0, 1]
    pub angle_differential: f64,
    /// Fraction of the score taken from the angle differential, [0, 1]
    pub angle_weight: f64,
    /// Blended dissimilarity, [0, 1], 0 = identical
    pub score: f64,
}

/// One frame's blended scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedFrame {
    pub overall_score: f64,
    /// Score per comparison vector, in `COMPARISON_VECTORS` order
    pub vector_scores: [BlendedVectorScore; COMPARISON_VECTOR_COUNT],
}

/// Score one learner frame against its reference frame.
///
/// Degenerate segments produce NaN components; frame summaries filter those
/// out instead of averaging them.
pub fn compute(ref_pose: &Pose2D, user_pose: &Pose2D, config: &EvaluationConfig) -> BlendedFrame {
    let ref_scale = scale_indicator_2d(ref_pose);
    let user_scale = scale_indicator_2d(user_pose);

    let mut vector_scores = [BlendedVectorScore {
        magnitude_differential: 0.0,
        angle_differential: 0.0,
        angle_weight: 0.0,
        score: 0.0,
    }; COMPARISON_VECTOR_COUNT];

    for (slot, (src, dst)) in vector_scores.iter_mut().zip(COMPARISON_VECTORS) {
        let ref_vec = segment_2d(ref_pose, src, dst);
        let user_vec = segment_2d(user_pose, src, dst);
        let ref_mag = magnitude_2d(ref_vec);
        let user_mag = magnitude_2d(user_vec);
        let adj_user_mag = user_mag * ref_scale / user_scale;

        let magnitude_differential =
            (ref_mag - adj_user_mag).abs() / ref_mag.max(adj_user_mag);
        let angle_differential =
            inner_angle_2d(ref_vec, user_vec) / std::f64::consts::PI;

        let angle_weight = reliability(ref_mag, config).min(reliability(user_mag, config));
        let score =
            angle_weight * angle_differential + (1.0 - angle_weight) * magnitude_differential;

        *slot = BlendedVectorScore {
            magnitude_differential,
            angle_differential,
            angle_weight,
            score,
        };
    }

    BlendedFrame {
        overall_score: vector_scores.iter().map(|v| v.score).sum::<f64>()
            / COMPARISON_VECTOR_COUNT as f64,
        vector_scores,
    }
}

/// How much to trust a segment's 2D angle, from its pixel magnitude.
fn reliability(magnitude_px: f64, config: &EvaluationConfig) -> f64 {
    lerp(
        magnitude_px,
        config.min_reliable_angle_magnitude_px,
        config.target_reliable_angle_magnitude_px,
        0.0,
        1.0,
        true,
    )
}

/// Reduce a frame history to per-attempt means, filtering NaN frames.
pub fn summarize<'a>(frames: impl Iterator<Item = &'a BlendedFrame>) -> Option<MetricSummary> {
    let frames: Vec<&BlendedFrame> = frames.collect();
    let overall_score = mean_filtered(frames.iter().map(|f| f.overall_score))?;
    let per_vector_scores = COMPARISON_VECTOR_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            (
                name.clone(),
                mean_filtered(frames.iter().map(|f| f.vector_scores[i].score)),
            )
        })
        .collect();
    Some(MetricSummary {
        metric: LiveMetricKind::Blended,
        overall_score,
        min_possible_score: 0.0,
        max_possible_score: 1.0,
        per_vector_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, PixelLandmark, LANDMARK_COUNT};

    fn spread_pose() -> Pose2D {
        let mut arr = [PixelLandmark::new(0.0, 0.0); LANDMARK_COUNT];
        for (i, lm) in arr.iter_mut().enumerate() {
            lm.x = 30.0 + 17.0 * (i as f64);
            lm.y = 400.0 - 11.0 * (i as f64);
        }
        Pose2D(arr)
    }

    fn set(pose: &mut Pose2D, lm: Landmark, x: f64, y: f64) {
        pose.0[lm.index()].x = x;
        pose.0[lm.index()].y = y;
    }

    #[test]
    fn identical_poses_score_zero() {
        let pose = spread_pose();
        let frame = compute(&pose, &pose, &EvaluationConfig::default());
        assert!(frame.overall_score.abs() < 1e-9);
        for v in frame.vector_scores {
            assert!(v.score.abs() < 1e-9);
        }
    }

    #[test]
    fn uniform_scaling_scores_zero() {
        let reference = spread_pose();
        let mut scaled = reference.clone();
        for lm in scaled.0.iter_mut() {
            lm.x *= 1.8;
            lm.y *= 1.8;
        }
        let frame = compute(&reference, &scaled, &EvaluationConfig::default());
        assert!(frame.overall_score.abs() < 1e-9);
    }

    #[test]
    fn short_segments_are_scored_by_magnitude_alone() {
        let config = EvaluationConfig::default();
        let mut reference = spread_pose();
        let mut user = spread_pose();
        // 10px forearm, well below the 50px reliability floor, same length
        // but rotated 90 degrees.
        let elbow = *reference.get(Landmark::LeftElbow);
        set(&mut reference, Landmark::LeftWrist, elbow.x + 10.0, elbow.y);
        set(&mut user, Landmark::LeftWrist, elbow.x, elbow.y + 10.0);

        let frame = compute(&reference, &user, &config);
        let forearm = frame.vector_scores[5];
        assert!(forearm.angle_weight.abs() < 1e-9);
        assert!((forearm.angle_differential - 0.5).abs() < 1e-9);
        assert!(forearm.score.abs() < 1e-9);
    }

    #[test]
    fn long_segments_are_scored_by_angle_alone() {
        let config = EvaluationConfig::default();
        let mut reference = spread_pose();
        let mut user = spread_pose();
        // 150px forearm, above the 100px target, same length, 90 degrees
        // apart.
        let elbow = *reference.get(Landmark::LeftElbow);
        set(&mut reference, Landmark::LeftWrist, elbow.x + 150.0, elbow.y);
        set(&mut user, Landmark::LeftWrist, elbow.x, elbow.y + 150.0);

        let frame = compute(&reference, &user, &config);
        let forearm = frame.vector_scores[5];
        assert!((forearm.angle_weight - 1.0).abs() < 1e-9);
        assert!((forearm.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn angle_weight_stays_clamped_for_extreme_magnitudes() {
        let config = EvaluationConfig::default();
        let mut reference = spread_pose();
        let mut user = spread_pose();
        let elbow = *reference.get(Landmark::LeftElbow);
        set(&mut reference, Landmark::LeftWrist, elbow.x + 500.0, elbow.y);
        set(&mut user, Landmark::LeftWrist, elbow.x + 500.0, elbow.y);

        let frame = compute(&reference, &user, &config);
        let forearm = frame.vector_scores[5];
        assert!(forearm.angle_weight <= 1.0);
        assert!(forearm.angle_weight >= 0.0);
    }

    #[test]
    fn summary_filters_nan_frames() {
        let pose = spread_pose();
        let config = EvaluationConfig::default();
        let good = compute(&pose, &pose, &config);

        // Collapse a segment to force NaN components in one frame.
        let mut degenerate = pose.clone();
        degenerate.0[Landmark::LeftWrist.index()] =
            degenerate.0[Landmark::LeftElbow.index()];
        let bad = compute(&pose, &degenerate, &config);
        assert!(bad.vector_scores[5].angle_differential.is_nan());

        let frames = vec![good, bad];
        let summary = summarize(frames.iter()).unwrap();
        assert!(summary.overall_score.is_finite());
        // The degenerate vector still has one finite contribution.
        assert!(summary.per_vector_scores[5].1.is_some());
    }

    #[test]
    fn empty_history_is_unavailable() {
        let frames: Vec<BlendedFrame> = Vec::new();
        assert!(summarize(frames.iter()).is_none());
    }
}
