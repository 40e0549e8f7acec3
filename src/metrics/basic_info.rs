// Basic track information summary
//
// Frame counts, wall-clock and video-time durations, effective frame rates,
// and how many frames arrived with a duplicated video timestamp. Cheap
// sanity numbers recorded next to the real metrics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TrackHistory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicInfoSummary {
    pub pose_frame_count: usize,
    pub real_time_duration_secs: f64,
    pub real_time_fps: f64,
    pub video_time_duration_secs: f64,
    pub video_time_fps: f64,
    /// Frames whose video timestamp repeated an earlier frame's
    pub duplicate_frame_time_count: usize,
}

impl BasicInfoSummary {
    pub fn format(&self) -> Vec<(String, Value)> {
        vec![
            (
                "pose_frame_count".to_string(),
                Value::from(self.pose_frame_count),
            ),
            (
                "real_time_duration_secs".to_string(),
                Value::from(self.real_time_duration_secs),
            ),
            ("real_time_fps".to_string(), Value::from(self.real_time_fps)),
            (
                "video_time_duration_secs".to_string(),
                Value::from(self.video_time_duration_secs),
            ),
            (
                "video_time_fps".to_string(),
                Value::from(self.video_time_fps),
            ),
            (
                "duplicate_frame_time_count".to_string(),
                Value::from(self.duplicate_frame_time_count),
            ),
        ]
    }
}

/// Summarize a track's timing shape. `None` for an empty history.
pub fn summarize(history: &TrackHistory<'_>) -> Option<BasicInfoSummary> {
    let video_times = history.video_times_secs;
    let actual_times = history.actual_times_ms;
    if video_times.is_empty() || actual_times.is_empty() {
        return None;
    }

    let pose_frame_count = video_times.len();
    let real_time_duration_secs =
        (actual_times[actual_times.len() - 1] - actual_times[0]) / 1000.0;
    let video_time_duration_secs = video_times[video_times.len() - 1] - video_times[0];

    // Times are non-decreasing, so duplicates are always adjacent.
    let duplicate_frame_time_count = video_times
        .windows(2)
        .filter(|pair| pair[0] == pair[1])
        .count();

    Some(BasicInfoSummary {
        pose_frame_count,
        real_time_duration_secs,
        real_time_fps: pose_frame_count as f64 / real_time_duration_secs,
        video_time_duration_secs,
        video_time_fps: pose_frame_count as f64 / video_time_duration_secs,
        duplicate_frame_time_count,
    })
}
