// Dance Trainer Core - motion similarity and temporal alignment engine
//
// Compares a learner's pose stream against prerecorded reference
// choreography: per-frame similarity metrics, whole-attempt kinematic and
// alignment descriptors, and append-only track recording for later
// analysis.

pub mod config;
pub mod dtw;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod pose;
pub mod reference;
pub mod summary;
pub mod track;

pub use config::EvaluationConfig;
pub use dtw::DynamicTimeWarping;
pub use error::{ErrorCode, EvaluationError, MetricError, TrackError};
pub use evaluator::{summarize_track, AttemptSummary, Evaluator};
pub use metrics::{
    FramePair, LiveMetricKind, MetricFrameResult, MetricSummary, SummaryMetricKind,
    SummaryMetricResult, TrackHistory,
};
pub use pose::{Landmark, PixelLandmark, Pose2D, Pose3D, WorldLandmark, LANDMARK_COUNT};
pub use reference::ReferenceData;
pub use summary::{summary_stats, vector_highlights, SummaryStats, VectorHighlights};
pub use track::{adjust_time_array, remove_duplicate_frame_times, Track, TrackRecorder};
