// Pose vector math and shared statistics
//
// Pure functions over pose frames and score arrays. Everything downstream
// (similarity metrics, kinematic descriptors, summaries) is built on these.

use super::frame::{Pose2D, Pose3D};
use super::landmark::Landmark;

/// Map `val` linearly from [src_min, src_max] to [dest_min, dest_max].
///
/// With `limit` set, the result is clamped to the destination range.
pub fn lerp(val: f64, src_min: f64, src_max: f64, dest_min: f64, dest_max: f64, limit: bool) -> f64 {
    let src_range = src_max - src_min;
    let dest_range = dest_max - dest_min;
    let mapped = dest_min + dest_range * ((val - src_min) / src_range);
    if limit {
        mapped.max(dest_min.min(dest_max)).min(dest_min.max(dest_max))
    } else {
        mapped
    }
}

/// Directed 2D segment from `src` to `dst`, in pixels.
pub fn segment_2d(pose: &Pose2D, src: Landmark, dst: Landmark) -> [f64; 2] {
    let s = pose.get(src);
    let d = pose.get(dst);
    [d.x - s.x, d.y - s.y]
}

/// Directed 3D segment from `src` to `dst`.
pub fn segment_3d(pose: &Pose3D, src: Landmark, dst: Landmark) -> [f64; 3] {
    let s = pose.get(src);
    let d = pose.get(dst);
    [d.x - s.x, d.y - s.y, d.z - s.z]
}

pub fn magnitude_2d(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

pub fn magnitude_3d(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Unit vector along `v`. A zero-length input yields NaN components, which
/// the metric summaries filter out rather than average.
pub fn normalized_2d(v: [f64; 2]) -> [f64; 2] {
    let mag = magnitude_2d(v);
    [v[0] / mag, v[1] / mag]
}

pub fn normalized_3d(v: [f64; 3]) -> [f64; 3] {
    let mag = magnitude_3d(v);
    [v[0] / mag, v[1] / mag, v[2] / mag]
}

/// Unit 2D segment between two landmarks.
pub fn normalized_segment_2d(pose: &Pose2D, src: Landmark, dst: Landmark) -> [f64; 2] {
    normalized_2d(segment_2d(pose, src, dst))
}

/// Inner angle between two 2D vectors, in radians.
///
/// The cosine is clamped to [-1, 1] so floating-point overshoot cannot turn
/// into NaN; a zero-length input still yields NaN (angle is undefined).
pub fn inner_angle_2d(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    let dot = v1[0] * v2[0] + v1[1] * v2[1];
    let cos = dot / (magnitude_2d(v1) * magnitude_2d(v2));
    cos.clamp(-1.0, 1.0).acos()
}

/// Inner angle between two 3D vectors, in radians.
pub fn inner_angle_3d(v1: [f64; 3], v2: [f64; 3]) -> f64 {
    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
    let cos = dot / (magnitude_3d(v1) * magnitude_3d(v2));
    cos.clamp(-1.0, 1.0).acos()
}

/// Inner angle between two landmark segments of one 3D frame.
pub fn inner_angle_from_frame(
    pose: &Pose3D,
    vec1: (Landmark, Landmark),
    vec2: (Landmark, Landmark),
) -> f64 {
    let v1 = segment_3d(pose, vec1.0, vec1.1);
    let v2 = segment_3d(pose, vec2.0, vec2.1);
    inner_angle_3d(v1, v2)
}

/// Body-scale indicator for a 2D pose.
///
/// Subject size in pixels varies with distance to the camera, so comparisons
/// between subjects are normalized by a per-pose scale derived from torso
/// heights and shoulder width.
pub fn scale_indicator_2d(pose: &Pose2D) -> f64 {
    let left_torso = magnitude_2d(segment_2d(pose, Landmark::LeftShoulder, Landmark::LeftHip));
    let right_torso = magnitude_2d(segment_2d(pose, Landmark::RightShoulder, Landmark::RightHip));
    let shoulder_width =
        magnitude_2d(segment_2d(pose, Landmark::LeftShoulder, Landmark::RightShoulder));
    0.25 * left_torso + 0.25 * right_torso + 0.5 * shoulder_width
}

/// Body-scale indicator for a 3D pose, same weighting as the 2D variant.
pub fn scale_indicator_3d(pose: &Pose3D) -> f64 {
    let left_torso = magnitude_3d(segment_3d(pose, Landmark::LeftShoulder, Landmark::LeftHip));
    let right_torso = magnitude_3d(segment_3d(pose, Landmark::RightShoulder, Landmark::RightHip));
    let shoulder_width =
        magnitude_3d(segment_3d(pose, Landmark::LeftShoulder, Landmark::RightShoulder));
    0.25 * left_torso + 0.25 * right_torso + 0.5 * shoulder_width
}

/// Generalized Minkowski norm: `(Σ |v|^p)^(1/p)`.
///
/// Defined as 0 for an empty input regardless of p. Negative and fractional
/// p are passed straight through the same formula; large p approaches the
/// maximum absolute value (verified by test, not by a special code path).
pub fn p_norm(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| v.abs().powf(p)).sum();
    sum.powf(1.0 / p)
}

/// p-norm normalized by element count: `p_norm(v, p) / n^(1/p)`.
///
/// This is the generalized mean family: p=1 gives the arithmetic mean,
/// p=-1 the harmonic mean, p→∞ the max and p→-∞ the min. Negative p biases
/// the result toward the smallest element.
pub fn p_norm_average(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    p_norm(values, p) / (values.len() as f64).powf(1.0 / p)
}

pub fn arithmetic_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Harmonic mean: `n / Σ(1/v)`. Heavily penalizes any single small value,
/// which is why the 3D angle-similarity metric reduces with it.
pub fn harmonic_mean(values: &[f64]) -> f64 {
    values.len() as f64 / values.iter().map(|v| 1.0 / v).sum::<f64>()
}

pub fn geometric_mean(values: &[f64]) -> f64 {
    (values.iter().map(|v| v.ln()).sum::<f64>() / values.len() as f64).exp()
}

/// Arithmetic mean with NaN contributions filtered out.
///
/// Returns `None` when no finite values remain; callers report that as
/// "unavailable" rather than a score.
pub fn mean_filtered(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let kept: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if kept.is_empty() {
        None
    } else {
        Some(arithmetic_mean(&kept))
    }
}

/// Harmonic mean with NaN contributions filtered out.
pub fn harmonic_mean_filtered(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let kept: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if kept.is_empty() {
        None
    } else {
        Some(harmonic_mean(&kept))
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    let mean = arithmetic_mean(values);
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
#[path = "math_tests.rs"]
mod tests;
