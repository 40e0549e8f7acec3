// Kinematic error descriptors
//
// Derivative chains over landmark positions: velocity, acceleration, jerk.
// Velocities are normalized by a body-scale factor so subjects at different
// distances from the camera produce comparable numbers. A derivative sample
// is `None` whenever it cannot be computed (first frame, duplicate frame
// time, degenerate scale, non-finite input); `None` propagates through the
// chain and the final MAE/RMSE reductions average only the cells where both
// subjects have a defined value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MetricError;
use crate::pose::{scale_indicator_2d, Pose2D};

/// One frame of a derivative series: an optional D-component sample per
/// landmark.
pub type DerivativeFrame<const D: usize> = Vec<[Option<f64>; D]>;

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// First derivative of landmark positions, normalized by `scale`.
///
/// The result is frame-aligned with the input: the first frame (and any
/// frame with a repeated time) is all `None`.
pub fn velocities<const D: usize>(
    positions: &[Vec<[f64; D]>],
    times_secs: &[f64],
    scale: f64,
) -> Result<Vec<DerivativeFrame<D>>, MetricError> {
    let scales = vec![scale; positions.len()];
    velocities_scaled(positions, times_secs, &scales)
}

/// Like `velocities`, with a per-frame scale factor.
pub fn velocities_scaled<const D: usize>(
    positions: &[Vec<[f64; D]>],
    times_secs: &[f64],
    scales: &[f64],
) -> Result<Vec<DerivativeFrame<D>>, MetricError> {
    if positions.len() != times_secs.len() {
        return Err(MetricError::MismatchedFrameCount {
            poses: positions.len(),
            times: times_secs.len(),
        });
    }

    let mut out: Vec<DerivativeFrame<D>> = Vec::with_capacity(positions.len());
    for (i, frame) in positions.iter().enumerate() {
        if i == 0 {
            out.push(vec![[None; D]; frame.len()]);
            continue;
        }
        let dt = times_secs[i] - times_secs[i - 1];
        let prev = &positions[i - 1];
        let derived: DerivativeFrame<D> = frame
            .iter()
            .zip(prev.iter())
            .map(|(cur, prev)| {
                let mut sample = [None; D];
                for d in 0..D {
                    sample[d] = finite((cur[d] - prev[d]) / (dt * scales[i]));
                }
                sample
            })
            .collect();
        out.push(derived);
    }
    Ok(out)
}

/// Next derivative in the chain: velocities to accelerations, accelerations
/// to jerks. Any `None` operand yields a `None` sample.
pub fn derivative<const D: usize>(
    lower: &[DerivativeFrame<D>],
    times_secs: &[f64],
) -> Result<Vec<DerivativeFrame<D>>, MetricError> {
    if lower.len() != times_secs.len() {
        return Err(MetricError::MismatchedFrameCount {
            poses: lower.len(),
            times: times_secs.len(),
        });
    }

    let mut out: Vec<DerivativeFrame<D>> = Vec::with_capacity(lower.len());
    for (i, frame) in lower.iter().enumerate() {
        if i == 0 {
            out.push(vec![[None; D]; frame.len()]);
            continue;
        }
        let dt = times_secs[i] - times_secs[i - 1];
        let prev = &lower[i - 1];
        let derived: DerivativeFrame<D> = frame
            .iter()
            .zip(prev.iter())
            .map(|(cur, prev)| {
                let mut sample = [None; D];
                for d in 0..D {
                    sample[d] = match (cur[d], prev[d]) {
                        (Some(c), Some(p)) => finite((c - p) / dt),
                        _ => None,
                    };
                }
                sample
            })
            .collect();
        out.push(derived);
    }
    Ok(out)
}

/// Per-landmark magnitudes of a derivative series. A sample with any
/// undefined component has an undefined magnitude.
pub fn magnitudes<const D: usize>(frames: &[DerivativeFrame<D>]) -> Vec<Vec<Option<f64>>> {
    frames
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|sample| {
                    let mut sum_sq = 0.0;
                    for component in sample {
                        sum_sq += (*component)? * (*component)?;
                    }
                    Some(sum_sq.sqrt())
                })
                .collect()
        })
        .collect()
}

/// Mean absolute error between two matrices of optional samples, over the
/// cells where both are defined. `Ok(None)` when no such cell exists.
pub fn matrices_mae(
    a: &[Vec<Option<f64>>],
    b: &[Vec<Option<f64>>],
) -> Result<Option<f64>, MetricError> {
    reduce_defined_cells(a, b, |x, y| (x - y).abs()).map(|r| r.map(|(sum, n)| sum / n))
}

/// Root mean square error between two matrices of optional samples, over
/// the cells where both are defined.
pub fn matrices_rmse(
    a: &[Vec<Option<f64>>],
    b: &[Vec<Option<f64>>],
) -> Result<Option<f64>, MetricError> {
    reduce_defined_cells(a, b, |x, y| (x - y) * (x - y)).map(|r| r.map(|(sum, n)| (sum / n).sqrt()))
}

fn reduce_defined_cells(
    a: &[Vec<Option<f64>>],
    b: &[Vec<Option<f64>>],
    cell: impl Fn(f64, f64) -> f64,
) -> Result<Option<(f64, f64)>, MetricError> {
    if a.len() != b.len() {
        return Err(MetricError::MismatchedDimensions {
            rows_a: a.len(),
            rows_b: b.len(),
        });
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for (row_a, row_b) in a.iter().zip(b.iter()) {
        if row_a.len() != row_b.len() {
            return Err(MetricError::MismatchedDimensions {
                rows_a: row_a.len(),
                rows_b: row_b.len(),
            });
        }
        for (cell_a, cell_b) in row_a.iter().zip(row_b.iter()) {
            if let (Some(x), Some(y)) = (cell_a, cell_b) {
                sum += cell(*x, *y);
                count += 1;
            }
        }
    }

    if count == 0 {
        Ok(None)
    } else {
        Ok(Some((sum, count as f64)))
    }
}

/// MAE/RMSE of the velocity, acceleration, and jerk magnitude chains
/// between learner and reference. Each field is `None` when no frame pair
/// had a defined value for that descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicErrorSummary {
    pub vels_mae: Option<f64>,
    pub vels_rmse: Option<f64>,
    pub accs_mae: Option<f64>,
    pub accs_rmse: Option<f64>,
    pub jerks_mae: Option<f64>,
    pub jerks_rmse: Option<f64>,
}

impl KinematicErrorSummary {
    /// Flatten into a tabular-export row; unavailable descriptors export
    /// as null.
    pub fn format(&self) -> Vec<(String, Value)> {
        let cell = |v: Option<f64>| v.map(Value::from).unwrap_or(Value::Null);
        vec![
            ("vels_mae".to_string(), cell(self.vels_mae)),
            ("vels_rmse".to_string(), cell(self.vels_rmse)),
            ("accs_mae".to_string(), cell(self.accs_mae)),
            ("accs_rmse".to_string(), cell(self.accs_rmse)),
            ("jerks_mae".to_string(), cell(self.jerks_mae)),
            ("jerks_rmse".to_string(), cell(self.jerks_rmse)),
        ]
    }
}

/// Compute the kinematic error descriptors for a learner/reference frame
/// pair history.
///
/// Invalid (NaN) frames on either side are skipped before differentiation.
/// When a scale override is not given, each subject is normalized by its
/// own per-frame body scale. `Ok(None)` when fewer than two usable frames
/// remain.
pub fn kinematic_error_descriptors(
    user_poses: &[Pose2D],
    ref_poses: &[Pose2D],
    times_secs: &[f64],
    user_scale: Option<f64>,
    ref_scale: Option<f64>,
) -> Result<Option<KinematicErrorSummary>, MetricError> {
    if user_poses.len() != ref_poses.len() {
        return Err(MetricError::MismatchedDimensions {
            rows_a: user_poses.len(),
            rows_b: ref_poses.len(),
        });
    }
    if user_poses.len() != times_secs.len() {
        return Err(MetricError::MismatchedFrameCount {
            poses: user_poses.len(),
            times: times_secs.len(),
        });
    }

    let mut user_positions: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut ref_positions: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut user_scales: Vec<f64> = Vec::new();
    let mut ref_scales: Vec<f64> = Vec::new();
    let mut kept_times: Vec<f64> = Vec::new();

    for i in 0..user_poses.len() {
        if !user_poses[i].is_valid() || !ref_poses[i].is_valid() {
            continue;
        }
        user_positions.push(user_poses[i].0.iter().map(|lm| [lm.x, lm.y]).collect());
        ref_positions.push(ref_poses[i].0.iter().map(|lm| [lm.x, lm.y]).collect());
        user_scales.push(user_scale.unwrap_or_else(|| scale_indicator_2d(&user_poses[i])));
        ref_scales.push(ref_scale.unwrap_or_else(|| scale_indicator_2d(&ref_poses[i])));
        kept_times.push(times_secs[i]);
    }

    if kept_times.len() < 2 {
        return Ok(None);
    }

    let user_vels = velocities_scaled(&user_positions, &kept_times, &user_scales)?;
    let ref_vels = velocities_scaled(&ref_positions, &kept_times, &ref_scales)?;
    let user_accs = derivative(&user_vels, &kept_times)?;
    let ref_accs = derivative(&ref_vels, &kept_times)?;
    let user_jerks = derivative(&user_accs, &kept_times)?;
    let ref_jerks = derivative(&ref_accs, &kept_times)?;

    let user_vel_mags = magnitudes(&user_vels);
    let ref_vel_mags = magnitudes(&ref_vels);
    let user_acc_mags = magnitudes(&user_accs);
    let ref_acc_mags = magnitudes(&ref_accs);
    let user_jerk_mags = magnitudes(&user_jerks);
    let ref_jerk_mags = magnitudes(&ref_jerks);

    Ok(Some(KinematicErrorSummary {
        vels_mae: matrices_mae(&user_vel_mags, &ref_vel_mags)?,
        vels_rmse: matrices_rmse(&user_vel_mags, &ref_vel_mags)?,
        accs_mae: matrices_mae(&user_acc_mags, &ref_acc_mags)?,
        accs_rmse: matrices_rmse(&user_acc_mags, &ref_acc_mags)?,
        jerks_mae: matrices_mae(&user_jerk_mags, &ref_jerk_mags)?,
        jerks_rmse: matrices_rmse(&user_jerk_mags, &ref_jerk_mags)?,
    }))
}
