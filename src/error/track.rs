// Track recording error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Track error code constants
///
/// These constants provide a single source of truth for error codes shared
/// with consumers of the engine.
///
/// Error code range: 1001-1005
pub struct TrackErrorCodes {}

impl TrackErrorCodes {
    /// Frame time went backwards relative to the last recorded frame
    pub const NON_MONOTONIC_FRAME_TIME: i32 = 1001;

    /// A track with the given id already exists
    pub const TRACK_EXISTS: i32 = 1002;

    /// No track with the given id exists
    pub const TRACK_NOT_FOUND: i32 = 1003;

    /// Parallel arrays passed to the recorder disagree in length
    pub const MISMATCHED_LENGTHS: i32 = 1004;

    /// The metric results supplied for a frame do not match the track's
    /// established metric set
    pub const METRIC_SET_MISMATCH: i32 = 1005;
}

/// Errors raised by the evaluation track recorder.
///
/// Every variant indicates a caller bug upstream of the engine (violated
/// append-only or parallel-array invariants); none are silently recovered.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Frame time is strictly less than the last recorded frame time
    NonMonotonicFrameTime {
        track_id: String,
        frame_time: f64,
        last_frame_time: f64,
        frame_count: usize,
    },

    /// A track with this id already exists
    TrackExists { track_id: String },

    /// No track with this id exists
    TrackNotFound { track_id: String },

    /// Parallel arrays disagree in length
    MismatchedLengths { expected: usize, actual: usize },

    /// Per-frame metric results do not match the track's metric set
    MetricSetMismatch { track_id: String },
}

impl ErrorCode for TrackError {
    fn code(&self) -> i32 {
        match self {
            TrackError::NonMonotonicFrameTime { .. } => {
                TrackErrorCodes::NON_MONOTONIC_FRAME_TIME
            }
            TrackError::TrackExists { .. } => TrackErrorCodes::TRACK_EXISTS,
            TrackError::TrackNotFound { .. } => TrackErrorCodes::TRACK_NOT_FOUND,
            TrackError::MismatchedLengths { .. } => TrackErrorCodes::MISMATCHED_LENGTHS,
            TrackError::MetricSetMismatch { .. } => TrackErrorCodes::METRIC_SET_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            TrackError::NonMonotonicFrameTime {
                track_id,
                frame_time,
                last_frame_time,
                frame_count,
            } => format!(
                "Frame time must be non-decreasing. Track: {}, frame time: {}, last frame time: {}, frame count: {}",
                track_id, frame_time, last_frame_time, frame_count
            ),
            TrackError::TrackExists { track_id } => {
                format!("Track with id {} already exists", track_id)
            }
            TrackError::TrackNotFound { track_id } => {
                format!("Track with id {} does not exist", track_id)
            }
            TrackError::MismatchedLengths { expected, actual } => format!(
                "Mismatched parallel array lengths (expected {}, got {})",
                expected, actual
            ),
            TrackError::MetricSetMismatch { track_id } => format!(
                "Metric results for track {} do not match the metric set recorded on the first frame",
                track_id
            ),
        }
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for TrackError {}

/// Log a track error with structured context
pub fn log_track_error(err: &TrackError, context: &str) {
    error!(
        "Track error [code={}] in {}: {}",
        err.code(),
        context,
        err.message()
    );
}
