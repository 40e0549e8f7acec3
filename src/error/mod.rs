// Error types for the dance trainer engine
//
// This module defines custom error types for track recording and metric
// computation, providing structured error handling with error codes suitable
// for reporting across the consumer boundary.

mod metric;
mod track;

pub use metric::{log_metric_error, MetricError, MetricErrorCodes};
pub use track::{log_track_error, TrackError, TrackErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages from
/// custom error types, enabling consistent error handling across the
/// consumer boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Union of the engine's error domains, for call paths (the evaluator) that
/// touch both the recorder and the metric computations.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    Track(TrackError),
    Metric(MetricError),
}

impl ErrorCode for EvaluationError {
    fn code(&self) -> i32 {
        match self {
            EvaluationError::Track(err) => err.code(),
            EvaluationError::Metric(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            EvaluationError::Track(err) => err.message(),
            EvaluationError::Metric(err) => err.message(),
        }
    }
}

impl std::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EvaluationError {}

impl From<TrackError> for EvaluationError {
    fn from(err: TrackError) -> Self {
        EvaluationError::Track(err)
    }
}

impl From<MetricError> for EvaluationError {
    fn from(err: MetricError) -> Self {
        EvaluationError::Metric(err)
    }
}
