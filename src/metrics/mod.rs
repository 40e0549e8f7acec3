// Metrics module - similarity and summary metrics over recorded attempts
//
// Two families of metrics share this module:
// - Live metrics run once per recorded frame and are summarized afterwards
//   from their own frame history (unit-vector distance, blended
//   angle/magnitude distance, 3D joint-angle similarity).
// - Summary metrics run once over a whole track history (kinematic error,
//   DTW alignment, temporal offset, basic info).
//
// Both families are closed sets of tagged variants dispatched through
// uniform compute/summarize/format entry points, so the recorder and the
// evaluator never need to know metric internals.

use serde::{Deserialize, Serialize};

use crate::config::EvaluationConfig;
use crate::error::MetricError;
use crate::pose::{Pose2D, Pose3D};

pub mod alignment;
pub mod angle3d;
pub mod basic_info;
pub mod blended;
pub mod kinematics;
pub mod unit_vector;

pub use alignment::{AngleDtwSummary, TemporalOffsetSummary};
pub use angle3d::Angle3dFrame;
pub use basic_info::BasicInfoSummary;
pub use blended::BlendedFrame;
pub use kinematics::KinematicErrorSummary;
pub use unit_vector::UnitVectorFrame;

/// One frame's worth of input to the live metrics: the learner's and the
/// reference's pose in both spaces.
#[derive(Debug, Clone, Copy)]
pub struct FramePair<'a> {
    pub user_2d: &'a Pose2D,
    pub user_3d: &'a Pose3D,
    pub ref_2d: &'a Pose2D,
    pub ref_3d: &'a Pose3D,
}

/// Borrowed view of a track's parallel frame histories, consumed by the
/// summary metrics.
#[derive(Debug, Clone, Copy)]
pub struct TrackHistory<'a> {
    /// Video-relative frame times in seconds (non-decreasing)
    pub video_times_secs: &'a [f64],
    /// Wall-clock capture times in milliseconds
    pub actual_times_ms: &'a [f64],
    pub user_2d: &'a [Pose2D],
    pub user_3d: &'a [Pose3D],
    pub ref_2d: &'a [Pose2D],
    pub ref_3d: &'a [Pose3D],
}

impl TrackHistory<'_> {
    pub fn frame_count(&self) -> usize {
        self.video_times_secs.len()
    }
}

/// The closed set of per-frame metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveMetricKind {
    /// Unit-vector distance over the 8 comparison vectors, scored [5, 0]
    UnitVector,
    /// Angle/magnitude blended dissimilarity, scored [0, 1]
    Blended,
    /// 3D joint-angle similarity, scored around [0, 1] (unclamped)
    Angle3d,
}

impl LiveMetricKind {
    pub const ALL: [LiveMetricKind; 3] = [
        LiveMetricKind::UnitVector,
        LiveMetricKind::Blended,
        LiveMetricKind::Angle3d,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LiveMetricKind::UnitVector => "unit_vector_similarity",
            LiveMetricKind::Blended => "blended_similarity",
            LiveMetricKind::Angle3d => "angle_3d_similarity",
        }
    }

    /// Score polarity: the blended metric is a dissimilarity (0 = best),
    /// the other two are similarities.
    pub fn higher_is_better(self) -> bool {
        match self {
            LiveMetricKind::UnitVector => true,
            LiveMetricKind::Blended => false,
            LiveMetricKind::Angle3d => true,
        }
    }

    /// Compute this metric for a single frame.
    pub fn compute(self, pair: &FramePair<'_>, config: &EvaluationConfig) -> MetricFrameResult {
        match self {
            LiveMetricKind::UnitVector => {
                MetricFrameResult::UnitVector(unit_vector::compute(pair.ref_2d, pair.user_2d))
            }
            LiveMetricKind::Blended => {
                MetricFrameResult::Blended(blended::compute(pair.ref_2d, pair.user_2d, config))
            }
            LiveMetricKind::Angle3d => {
                MetricFrameResult::Angle3d(angle3d::compute(pair.ref_3d, pair.user_3d))
            }
        }
    }

    /// Reduce this metric's frame history into a per-attempt summary.
    ///
    /// Returns `None` when the history holds no eligible frames, which is
    /// distinct from a worst-possible score.
    pub fn summarize(self, frames: &[MetricFrameResult]) -> Option<MetricSummary> {
        match self {
            LiveMetricKind::UnitVector => {
                unit_vector::summarize(frames.iter().filter_map(MetricFrameResult::as_unit_vector))
            }
            LiveMetricKind::Blended => {
                blended::summarize(frames.iter().filter_map(MetricFrameResult::as_blended))
            }
            LiveMetricKind::Angle3d => {
                angle3d::summarize(frames.iter().filter_map(MetricFrameResult::as_angle3d))
            }
        }
    }
}

/// One live metric's output for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricFrameResult {
    UnitVector(UnitVectorFrame),
    Blended(BlendedFrame),
    Angle3d(Angle3dFrame),
}

impl MetricFrameResult {
    pub fn kind(&self) -> LiveMetricKind {
        match self {
            MetricFrameResult::UnitVector(_) => LiveMetricKind::UnitVector,
            MetricFrameResult::Blended(_) => LiveMetricKind::Blended,
            MetricFrameResult::Angle3d(_) => LiveMetricKind::Angle3d,
        }
    }

    /// The frame's overall score, whatever the metric's scoring range.
    pub fn overall_score(&self) -> f64 {
        match self {
            MetricFrameResult::UnitVector(f) => f.overall_score,
            MetricFrameResult::Blended(f) => f.overall_score,
            MetricFrameResult::Angle3d(f) => f.overall_score,
        }
    }

    fn as_unit_vector(&self) -> Option<&UnitVectorFrame> {
        match self {
            MetricFrameResult::UnitVector(f) => Some(f),
            _ => None,
        }
    }

    fn as_blended(&self) -> Option<&BlendedFrame> {
        match self {
            MetricFrameResult::Blended(f) => Some(f),
            _ => None,
        }
    }

    fn as_angle3d(&self) -> Option<&Angle3dFrame> {
        match self {
            MetricFrameResult::Angle3d(f) => Some(f),
            _ => None,
        }
    }
}

/// Per-attempt reduction of one live metric's frame history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Which live metric produced this summary
    pub metric: LiveMetricKind,
    pub overall_score: f64,
    pub min_possible_score: f64,
    pub max_possible_score: f64,
    /// Mean score per comparison vector/joint, by name. `None` entries had
    /// no finite frame contributions.
    pub per_vector_scores: Vec<(String, Option<f64>)>,
}

impl MetricSummary {
    /// Flatten into a tabular-export row: "overall" plus one column per
    /// comparison vector. Unavailable vectors are omitted.
    pub fn format(&self) -> Vec<(String, f64)> {
        let mut row = vec![("overall".to_string(), self.overall_score)];
        for (name, score) in &self.per_vector_scores {
            if let Some(score) = score {
                row.push((name.clone(), *score));
            }
        }
        row
    }
}

/// The closed set of whole-track summary metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMetricKind {
    /// MAE/RMSE of velocity, acceleration, and jerk magnitudes
    KinematicError,
    /// DTW alignment under the 3D angle distance
    AngleDtw,
    /// Impact-envelope cross-correlation temporal offset
    TemporalOffset,
    /// Frame counts, durations, frame rates
    BasicInfo,
}

impl SummaryMetricKind {
    pub const ALL: [SummaryMetricKind; 4] = [
        SummaryMetricKind::KinematicError,
        SummaryMetricKind::AngleDtw,
        SummaryMetricKind::TemporalOffset,
        SummaryMetricKind::BasicInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SummaryMetricKind::KinematicError => "kinematic_error",
            SummaryMetricKind::AngleDtw => "angle_dtw",
            SummaryMetricKind::TemporalOffset => "temporal_offset",
            SummaryMetricKind::BasicInfo => "basic_info",
        }
    }

    /// Compute this metric over a whole track history.
    ///
    /// `Ok(None)` means the history had no eligible frames ("unavailable");
    /// `Err` indicates a violated invariant in the caller's data.
    pub fn summarize(
        self,
        history: &TrackHistory<'_>,
        config: &EvaluationConfig,
    ) -> Result<Option<SummaryMetricResult>, MetricError> {
        match self {
            SummaryMetricKind::KinematicError => Ok(kinematics::kinematic_error_descriptors(
                history.user_2d,
                history.ref_2d,
                history.video_times_secs,
                None,
                None,
            )?
            .map(SummaryMetricResult::KinematicError)),
            SummaryMetricKind::AngleDtw => Ok(alignment::angle_dtw(history, config)?
                .map(SummaryMetricResult::AngleDtw)),
            SummaryMetricKind::TemporalOffset => Ok(alignment::temporal_offset(history)?
                .map(SummaryMetricResult::TemporalOffset)),
            SummaryMetricKind::BasicInfo => {
                Ok(basic_info::summarize(history).map(SummaryMetricResult::BasicInfo))
            }
        }
    }
}

/// One summary metric's per-attempt output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum SummaryMetricResult {
    KinematicError(KinematicErrorSummary),
    AngleDtw(AngleDtwSummary),
    TemporalOffset(TemporalOffsetSummary),
    BasicInfo(BasicInfoSummary),
}

impl SummaryMetricResult {
    pub fn kind(&self) -> SummaryMetricKind {
        match self {
            SummaryMetricResult::KinematicError(_) => SummaryMetricKind::KinematicError,
            SummaryMetricResult::AngleDtw(_) => SummaryMetricKind::AngleDtw,
            SummaryMetricResult::TemporalOffset(_) => SummaryMetricKind::TemporalOffset,
            SummaryMetricResult::BasicInfo(_) => SummaryMetricKind::BasicInfo,
        }
    }

    /// Flatten into a tabular-export row.
    pub fn format(&self) -> Vec<(String, serde_json::Value)> {
        match self {
            SummaryMetricResult::KinematicError(s) => s.format(),
            SummaryMetricResult::AngleDtw(s) => s.format(),
            SummaryMetricResult::TemporalOffset(s) => s.format(),
            SummaryMetricResult::BasicInfo(s) => s.format(),
        }
    }
}
