// Metric computation error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Metric error code constants
///
/// Error code range: 2001-2003
pub struct MetricErrorCodes {}

impl MetricErrorCodes {
    /// Learner and reference matrices disagree in shape
    pub const MISMATCHED_DIMENSIONS: i32 = 2001;

    /// A sequence aligner was given an empty sequence
    pub const EMPTY_SEQUENCE: i32 = 2002;

    /// Pose sequences and frame times disagree in length
    pub const MISMATCHED_FRAME_COUNT: i32 = 2003;
}

/// Errors raised by metric computations.
///
/// These are invariant violations (caller bugs), distinct from missing or
/// undefined samples, which propagate as `None` through the descriptor
/// chains instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// Learner and reference matrices disagree in shape
    MismatchedDimensions {
        rows_a: usize,
        rows_b: usize,
    },

    /// A sequence aligner was given an empty sequence
    EmptySequence,

    /// Pose sequences and frame times disagree in length
    MismatchedFrameCount { poses: usize, times: usize },
}

impl ErrorCode for MetricError {
    fn code(&self) -> i32 {
        match self {
            MetricError::MismatchedDimensions { .. } => MetricErrorCodes::MISMATCHED_DIMENSIONS,
            MetricError::EmptySequence => MetricErrorCodes::EMPTY_SEQUENCE,
            MetricError::MismatchedFrameCount { .. } => MetricErrorCodes::MISMATCHED_FRAME_COUNT,
        }
    }

    fn message(&self) -> String {
        match self {
            MetricError::MismatchedDimensions { rows_a, rows_b } => format!(
                "Mismatched matrix dimensions between learner and reference ({} vs {} rows)",
                rows_a, rows_b
            ),
            MetricError::EmptySequence => {
                "Sequence aligner requires non-empty input sequences".to_string()
            }
            MetricError::MismatchedFrameCount { poses, times } => format!(
                "Mismatched array lengths (poses: {}, frame times: {})",
                poses, times
            ),
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MetricError {}

/// Log a metric error with structured context
pub fn log_metric_error(err: &MetricError, context: &str) {
    error!(
        "Metric error [code={}] in {}: {}",
        err.code(),
        context,
        err.message()
    );
}
