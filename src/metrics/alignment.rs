// Temporal alignment metrics
//
// Two whole-track measures of how well the learner's timing matches the
// reference:
// - angle_dtw: dynamic time warping over the 3D frames under an
//   angle-similarity distance, reporting total distance, the warp path, and
//   a warping factor (0 = no warping needed).
// - temporal_offset: a constant-lag estimate from cross-correlating the two
//   subjects' "impact envelopes", a per-frame measure of how abruptly the
//   distribution of body motion directions is changing.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EvaluationConfig;
use crate::dtw::DynamicTimeWarping;
use crate::error::MetricError;
use crate::metrics::{angle3d, TrackHistory};
use crate::pose::{magnitude_3d, Pose3D, ANGLE_COMPARISONS};

/// DTW alignment summary under the 3D angle distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleDtwSummary {
    /// Total path cost under the angle distance
    pub dtw_distance: f64,
    /// Warp path as (user frame, reference frame) pairs
    pub dtw_path: Vec<(usize, usize)>,
    /// (path length - min(m, n)) / max(m, n); 0 when no warping was needed
    pub warping_factor: f64,
    /// DTW distance per named joint comparison
    pub joint_distances: Vec<(String, f64)>,
}

impl AngleDtwSummary {
    pub fn format(&self) -> Vec<(String, Value)> {
        vec![
            ("dtw_distance".to_string(), Value::from(self.dtw_distance)),
            (
                "dtw_path".to_string(),
                serde_json::to_value(&self.dtw_path).unwrap_or(Value::Null),
            ),
            (
                "warping_factor".to_string(),
                Value::from(self.warping_factor),
            ),
        ]
    }
}

/// Constant-lag temporal offset between learner and reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalOffsetSummary {
    /// Offset in frames; negative when the learner is behind the reference
    pub temporal_offset_frames: i64,
    /// The same offset converted through the track's measured frame rate
    pub temporal_offset_secs: f64,
}

impl TemporalOffsetSummary {
    pub fn format(&self) -> Vec<(String, Value)> {
        vec![
            (
                "temporal_offset_frames".to_string(),
                Value::from(self.temporal_offset_frames),
            ),
            (
                "temporal_offset_secs".to_string(),
                Value::from(self.temporal_offset_secs),
            ),
        ]
    }
}

/// Align the two 3D frame histories with DTW under an angle-similarity
/// distance. Frames that are invalid on either side are dropped (as a pair)
/// before alignment; `Ok(None)` when nothing usable remains.
pub fn angle_dtw(
    history: &TrackHistory<'_>,
    config: &EvaluationConfig,
) -> Result<Option<AngleDtwSummary>, MetricError> {
    let total = history.user_3d.len();
    if total != history.ref_3d.len() {
        return Err(MetricError::MismatchedDimensions {
            rows_a: total,
            rows_b: history.ref_3d.len(),
        });
    }
    if total == 0 {
        return Ok(None);
    }

    let mut user_frames: Vec<&Pose3D> = Vec::with_capacity(total);
    let mut ref_frames: Vec<&Pose3D> = Vec::with_capacity(total);
    for (user, reference) in history.user_3d.iter().zip(history.ref_3d.iter()) {
        if user.is_valid() && reference.is_valid() {
            user_frames.push(user);
            ref_frames.push(reference);
        }
    }

    let invalid = total - user_frames.len();
    if invalid > 0 {
        let ratio = invalid as f64 / total as f64;
        warn!(
            "Dropped {} invalid frames ({:.0}%) before DTW alignment",
            invalid,
            ratio * 100.0
        );
        if ratio > config.invalid_frame_warn_ratio {
            warn!(
                "More than {:.0}% of frames are invalid; alignment accuracy is degraded",
                config.invalid_frame_warn_ratio * 100.0
            );
        }
    }
    if user_frames.is_empty() {
        return Ok(None);
    }

    let mut dtw = DynamicTimeWarping::new(&user_frames, &ref_frames, |u: &&Pose3D, r: &&Pose3D| {
        let score = angle3d::compute(r, u).overall_score;
        if score.is_nan() {
            f64::INFINITY
        } else {
            (1.0 - score).abs()
        }
    })?;
    let dtw_distance = dtw.distance();
    let dtw_path = dtw.path().to_vec();

    // Warping factor is relative to the unfiltered track lengths.
    let warping_factor = (dtw_path.len() as f64 - total.min(history.ref_3d.len()) as f64)
        / total.max(history.ref_3d.len()) as f64;

    let mut joint_distances = Vec::with_capacity(ANGLE_COMPARISONS.len());
    for comparison in &ANGLE_COMPARISONS {
        let mut joint_dtw =
            DynamicTimeWarping::new(&user_frames, &ref_frames, |u: &&Pose3D, r: &&Pose3D| {
                let score = angle3d::compare_single(r, u, comparison).score;
                if score.is_nan() {
                    f64::INFINITY
                } else {
                    (1.0 - score).abs()
                }
            })?;
        joint_distances.push((comparison.name.to_string(), joint_dtw.distance()));
    }

    Ok(Some(AngleDtwSummary {
        dtw_distance,
        dtw_path,
        warping_factor,
        joint_distances,
    }))
}

/// Per-frame impact envelope of a 3D frame history.
///
/// Each frame's flow vectors (per-joint displacement to the next frame) are
/// binned into 8 direction bins by polar quadrant and z sign, weighted by
/// flow magnitude; the envelope is the total absolute change of that
/// histogram from frame to frame. Peaks mark moments where the motion
/// abruptly changes character.
fn impact_envelope(frames: &[Pose3D]) -> Vec<f64> {
    const BIN_DIRECTIONS: usize = 8;

    let mut posegram: Vec<[f64; BIN_DIRECTIONS]> = Vec::with_capacity(frames.len());
    for (frame, next) in frames.iter().zip(frames.iter().skip(1)) {
        let mut bins = [0.0; BIN_DIRECTIONS];
        for (joint, next_joint) in frame.0.iter().zip(next.0.iter()) {
            let flow = [
                next_joint.x - joint.x,
                next_joint.y - joint.y,
                next_joint.z - joint.z,
            ];
            let magnitude = magnitude_3d(flow);
            if !magnitude.is_finite() {
                continue;
            }
            let polar_angle = flow[1].atan2(flow[0]);
            let quadrant = (((polar_angle + std::f64::consts::PI)
                % (2.0 * std::f64::consts::PI))
                / (std::f64::consts::PI / 2.0))
                .floor() as usize;
            let bin = if flow[2] > 0.0 {
                (quadrant % 4) + 4
            } else {
                quadrant % 4
            };
            bins[bin] += magnitude;
        }
        posegram.push(bins);
    }
    // Last frame has no successor; its histogram is empty.
    posegram.push([0.0; BIN_DIRECTIONS]);

    let mut envelope = Vec::with_capacity(posegram.len());
    for (i, bins) in posegram.iter().enumerate() {
        let flux: f64 = match posegram.get(i + 1) {
            Some(next) => bins
                .iter()
                .zip(next.iter())
                .map(|(cur, nxt)| (nxt - cur).abs())
                .sum(),
            None => 0.0,
        };
        envelope.push(flux);
    }
    envelope
}

/// Gaussian window centered mid-envelope, sigma = half the length. Frames
/// near the segment boundaries contribute less to the correlation.
fn weigh_by_gaussian(envelope: &[f64]) -> Vec<f64> {
    let center = (envelope.len() / 2) as f64;
    let sigma = envelope.len() as f64 / 2.0;
    envelope
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let offset = i as f64 - center;
            value * (-(offset * offset) / (2.0 * sigma * sigma)).exp()
        })
        .collect()
}

/// Full cross-correlation of two equal-length signals; index `lag + n - 1`
/// holds the correlation at that lag.
fn cross_correlate(signal_a: &[f64], signal_b: &[f64]) -> Vec<f64> {
    let n = signal_a.len() as i64;
    let mut result = vec![0.0; (2 * n - 1) as usize];
    for lag in (1 - n)..n {
        let mut sum = 0.0;
        for (i, a) in signal_a.iter().enumerate() {
            let j = i as i64 + lag;
            if j >= 0 && j < n {
                sum += a * signal_b[j as usize];
            }
        }
        result[(lag + n - 1) as usize] = sum;
    }
    result
}

/// Estimate the constant temporal offset between the two subjects from
/// their impact envelopes. `Ok(None)` with fewer than two frames.
pub fn temporal_offset(
    history: &TrackHistory<'_>,
) -> Result<Option<TemporalOffsetSummary>, MetricError> {
    let n = history.user_3d.len();
    if n != history.ref_3d.len() {
        return Err(MetricError::MismatchedDimensions {
            rows_a: n,
            rows_b: history.ref_3d.len(),
        });
    }
    if n < 2 {
        return Ok(None);
    }

    let user_envelope = weigh_by_gaussian(&impact_envelope(history.user_3d));
    let ref_envelope = weigh_by_gaussian(&impact_envelope(history.ref_3d));

    let correlation = cross_correlate(&user_envelope, &ref_envelope);
    let mut peak_index = 0;
    for (i, value) in correlation.iter().enumerate() {
        if *value > correlation[peak_index] {
            peak_index = i;
        }
    }
    let temporal_offset_frames = peak_index as i64 - (n as i64 - 1);

    let first_ms = history.actual_times_ms[0];
    let last_ms = history.actual_times_ms[history.actual_times_ms.len() - 1];
    let ms_per_frame = (last_ms - first_ms) / (n as f64 - 1.0);
    let temporal_offset_secs = temporal_offset_frames as f64 * ms_per_frame / 1000.0;

    Ok(Some(TemporalOffsetSummary {
        temporal_offset_frames,
        temporal_offset_secs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{WorldLandmark, LANDMARK_COUNT};

    fn spread_pose(step: f64) -> Pose3D {
        let mut arr = [WorldLandmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        for (i, lm) in arr.iter_mut().enumerate() {
            lm.x = step + 0.1 * (i as f64);
            lm.y = 2.0 - 0.05 * (i as f64);
            lm.z = 0.02 * ((i % 5) as f64);
        }
        Pose3D(arr)
    }

    fn history<'a>(
        user: &'a [Pose3D],
        reference: &'a [Pose3D],
        video_times: &'a [f64],
        actual_times: &'a [f64],
    ) -> TrackHistory<'a> {
        TrackHistory {
            video_times_secs: video_times,
            actual_times_ms: actual_times,
            user_2d: &[],
            user_3d: user,
            ref_2d: &[],
            ref_3d: reference,
        }
    }

    #[test]
    fn identical_histories_need_no_warping() {
        let frames: Vec<Pose3D> = (0..5).map(|i| spread_pose(i as f64 * 0.3)).collect();
        let times: Vec<f64> = (0..5).map(|i| i as f64 / 30.0).collect();
        let ms: Vec<f64> = (0..5).map(|i| i as f64 * 33.0).collect();
        let summary = angle_dtw(
            &history(&frames, &frames, &times, &ms),
            &EvaluationConfig::default(),
        )
        .unwrap()
        .unwrap();
        assert!(summary.dtw_distance.abs() < 1e-9);
        assert!(summary.warping_factor.abs() < 1e-9);
        let diagonal: Vec<(usize, usize)> = (0..5).map(|i| (i, i)).collect();
        assert_eq!(summary.dtw_path, diagonal);
        assert_eq!(summary.joint_distances.len(), ANGLE_COMPARISONS.len());
        for (name, distance) in &summary.joint_distances {
            assert!(distance.abs() < 1e-9, "{}", name);
        }
    }

    #[test]
    fn invalid_frames_are_dropped_as_pairs() {
        let mut user: Vec<Pose3D> = (0..6).map(|i| spread_pose(i as f64 * 0.3)).collect();
        let reference = user.clone();
        user[2].0[0].x = f64::NAN;
        let times: Vec<f64> = (0..6).map(|i| i as f64 / 30.0).collect();
        let ms: Vec<f64> = (0..6).map(|i| i as f64 * 33.0).collect();
        let summary = angle_dtw(
            &history(&user, &reference, &times, &ms),
            &EvaluationConfig::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(summary.dtw_path.len(), 5);
        assert!(summary.dtw_distance.abs() < 1e-9);
    }

    #[test]
    fn all_invalid_frames_is_unavailable() {
        let mut frames: Vec<Pose3D> = (0..3).map(|i| spread_pose(i as f64)).collect();
        for frame in frames.iter_mut() {
            frame.0[0].x = f64::NAN;
        }
        let times = [0.0, 0.1, 0.2];
        let ms = [0.0, 100.0, 200.0];
        let result = angle_dtw(
            &history(&frames, &frames, &times, &ms),
            &EvaluationConfig::default(),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn mismatched_history_lengths_are_an_error() {
        let user: Vec<Pose3D> = (0..3).map(|i| spread_pose(i as f64)).collect();
        let reference: Vec<Pose3D> = (0..2).map(|i| spread_pose(i as f64)).collect();
        let times = [0.0, 0.1, 0.2];
        let ms = [0.0, 100.0, 200.0];
        assert!(matches!(
            angle_dtw(
                &history(&user, &reference, &times, &ms),
                &EvaluationConfig::default()
            ),
            Err(MetricError::MismatchedDimensions { rows_a: 3, rows_b: 2 })
        ));
    }

    // A burst sequence: stationary except for a unit +x jump of every joint
    // between `burst` and `burst + 1`.
    fn burst_sequence(frames: usize, burst: usize) -> Vec<Pose3D> {
        (0..frames)
            .map(|t| spread_pose(if t > burst { 1.0 } else { 0.0 }))
            .collect()
    }

    #[test]
    fn identical_movement_has_zero_offset() {
        let frames = burst_sequence(11, 5);
        let times: Vec<f64> = (0..11).map(|i| i as f64 / 30.0).collect();
        let ms: Vec<f64> = (0..11).map(|i| i as f64 * 100.0).collect();
        let summary = temporal_offset(&history(&frames, &frames, &times, &ms))
            .unwrap()
            .unwrap();
        assert_eq!(summary.temporal_offset_frames, 0);
        assert_eq!(summary.temporal_offset_secs, 0.0);
    }

    #[test]
    fn delayed_learner_shows_a_negative_offset() {
        let reference = burst_sequence(11, 4);
        let user = burst_sequence(11, 6);
        let times: Vec<f64> = (0..11).map(|i| i as f64 / 10.0).collect();
        let ms: Vec<f64> = (0..11).map(|i| i as f64 * 100.0).collect();
        let summary = temporal_offset(&history(&user, &reference, &times, &ms))
            .unwrap()
            .unwrap();
        assert_eq!(summary.temporal_offset_frames, -2);
        assert!((summary.temporal_offset_secs - -0.2).abs() < 1e-9);
    }

    #[test]
    fn single_frame_offset_is_unavailable() {
        let frames = vec![spread_pose(0.0)];
        let times = [0.0];
        let ms = [0.0];
        let result = temporal_offset(&history(&frames, &frames, &times, &ms)).unwrap();
        assert!(result.is_none());
    }
}
