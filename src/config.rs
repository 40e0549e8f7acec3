//! Configuration for the evaluation engine
//!
//! All tunable thresholds live here and are passed explicitly into the
//! computations that use them. Nothing in the engine reads process-wide
//! mutable settings; callers that want different thresholds per call simply
//! pass a different config value.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete evaluation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Below this 2D segment magnitude (pixels) the segment is considered
    /// foreshortened toward the camera and its angle is untrustworthy; the
    /// blended metric scores it by magnitude alone.
    pub min_reliable_angle_magnitude_px: f64,

    /// At or above this 2D segment magnitude (pixels) the segment lies in
    /// the image plane and its angle is fully trusted; the blended metric
    /// scores it by angle alone.
    pub target_reliable_angle_magnitude_px: f64,

    /// Number of standard deviations below the mean at which a comparison
    /// vector is flagged as an outlier in summaries.
    pub outlier_std_devs: f64,

    /// Fraction of invalid (NaN) frames above which the DTW alignment metric
    /// logs a warning about degraded accuracy.
    pub invalid_frame_warn_ratio: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_reliable_angle_magnitude_px: 50.0,
            target_reliable_angle_magnitude_px: 100.0,
            outlier_std_devs: 2.0,
            invalid_frame_warn_ratio: 0.1,
        }
    }
}

impl EvaluationConfig {
    /// Load configuration from a JSON file, falling back to defaults if the
    /// file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        path.display(),
                        err
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let config = EvaluationConfig::default();
        assert_eq!(config.min_reliable_angle_magnitude_px, 50.0);
        assert_eq!(config.target_reliable_angle_magnitude_px, 100.0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EvaluationConfig::load("/nonexistent/config.json");
        assert_eq!(config, EvaluationConfig::default());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EvaluationConfig {
            min_reliable_angle_magnitude_px: 40.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EvaluationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
