// Evaluation track recording
//
// A track is the append-only record of one attempt at a segment: parallel
// per-frame arrays of timestamps, learner poses, reference poses, and live
// metric results. Tracks are keyed by attempt id in the recorder and can be
// sliced into sub-tracks for per-segment summaries.

pub mod timing;

pub use timing::{adjust_time_array, remove_duplicate_frame_times};

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::metrics::{LiveMetricKind, MetricFrameResult, TrackHistory};
use crate::pose::{Pose2D, Pose3D};

/// One attempt's recorded evaluation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Attempt id, unique within a recorder
    pub id: String,
    /// Which dance this attempt belongs to
    pub dance_relative_stem: String,
    /// Human-readable description of the practiced segment
    pub segment_description: String,
    #[serde(default = "SystemTime::now")]
    pub creation_date: SystemTime,

    /// Video-relative frame times in seconds, non-decreasing
    pub video_times_secs: Vec<f64>,
    /// Wall-clock capture times in milliseconds
    pub actual_times_ms: Vec<f64>,
    pub user_2d_poses: Vec<Pose2D>,
    pub user_3d_poses: Vec<Pose3D>,
    pub ref_2d_poses: Vec<Pose2D>,
    pub ref_3d_poses: Vec<Pose3D>,

    /// Per-metric frame histories, all the same length as the time arrays.
    /// The key set is fixed by the first recorded frame.
    pub metric_series: HashMap<LiveMetricKind, Vec<MetricFrameResult>>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        dance_relative_stem: impl Into<String>,
        segment_description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            dance_relative_stem: dance_relative_stem.into(),
            segment_description: segment_description.into(),
            creation_date: SystemTime::now(),
            video_times_secs: Vec::new(),
            actual_times_ms: Vec::new(),
            user_2d_poses: Vec::new(),
            user_3d_poses: Vec::new(),
            ref_2d_poses: Vec::new(),
            ref_3d_poses: Vec::new(),
            metric_series: HashMap::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.video_times_secs.len()
    }

    /// Append one frame. Frame times must be non-decreasing; repeated times
    /// are allowed and handled later by the timing utilities. The metric
    /// key set must match the one established by the first frame.
    pub fn record_frame(
        &mut self,
        video_time_secs: f64,
        actual_time_ms: f64,
        user_2d: Pose2D,
        user_3d: Pose3D,
        ref_2d: Pose2D,
        ref_3d: Pose3D,
        metrics: HashMap<LiveMetricKind, MetricFrameResult>,
    ) -> Result<(), TrackError> {
        if let Some(last) = self.video_times_secs.last() {
            if video_time_secs < *last {
                return Err(TrackError::NonMonotonicFrameTime {
                    track_id: self.id.clone(),
                    frame_time: video_time_secs,
                    last_frame_time: *last,
                    frame_count: self.frame_count(),
                });
            }
        }

        if self.frame_count() == 0 {
            for kind in metrics.keys() {
                self.metric_series.insert(*kind, Vec::new());
            }
        } else if metrics.len() != self.metric_series.len()
            || !metrics.keys().all(|k| self.metric_series.contains_key(k))
        {
            return Err(TrackError::MetricSetMismatch {
                track_id: self.id.clone(),
            });
        }
        for (kind, result) in &metrics {
            if result.kind() != *kind {
                return Err(TrackError::MetricSetMismatch {
                    track_id: self.id.clone(),
                });
            }
        }

        self.video_times_secs.push(video_time_secs);
        self.actual_times_ms.push(actual_time_ms);
        self.user_2d_poses.push(user_2d);
        self.user_3d_poses.push(user_3d);
        self.ref_2d_poses.push(ref_2d);
        self.ref_3d_poses.push(ref_3d);
        for (kind, result) in metrics {
            if let Some(series) = self.metric_series.get_mut(&kind) {
                series.push(result);
            }
        }
        Ok(())
    }

    /// Borrowed view of the frame histories for the summary metrics.
    pub fn history(&self) -> TrackHistory<'_> {
        TrackHistory {
            video_times_secs: &self.video_times_secs,
            actual_times_ms: &self.actual_times_ms,
            user_2d: &self.user_2d_poses,
            user_3d: &self.user_3d_poses,
            ref_2d: &self.ref_2d_poses,
            ref_3d: &self.ref_3d_poses,
        }
    }

    /// Slice out the frames whose video time falls in the half-open range
    /// `[video_start_secs, video_end_secs)`. Returns `None` when the range
    /// selects no frames.
    pub fn sub_track(&self, video_start_secs: f64, video_end_secs: f64) -> Option<Track> {
        let frame_start = self
            .video_times_secs
            .iter()
            .position(|t| *t >= video_start_secs)?;
        let frame_end = self
            .video_times_secs
            .iter()
            .position(|t| *t >= video_end_secs)
            .unwrap_or(self.frame_count());
        if frame_end <= frame_start {
            return None;
        }

        let metric_series = self
            .metric_series
            .iter()
            .map(|(kind, series)| (*kind, series[frame_start..frame_end].to_vec()))
            .collect();

        Some(Track {
            id: self.id.clone(),
            dance_relative_stem: self.dance_relative_stem.clone(),
            segment_description: self.segment_description.clone(),
            creation_date: self.creation_date,
            video_times_secs: self.video_times_secs[frame_start..frame_end].to_vec(),
            actual_times_ms: self.actual_times_ms[frame_start..frame_end].to_vec(),
            user_2d_poses: self.user_2d_poses[frame_start..frame_end].to_vec(),
            user_3d_poses: self.user_3d_poses[frame_start..frame_end].to_vec(),
            ref_2d_poses: self.ref_2d_poses[frame_start..frame_end].to_vec(),
            ref_3d_poses: self.ref_3d_poses[frame_start..frame_end].to_vec(),
            metric_series,
        })
    }
}

/// Keyed collection of tracks, one per attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRecorder {
    pub tracks: HashMap<String, Track>,
}

impl TrackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh track for an attempt id.
    pub fn start_track(
        &mut self,
        id: impl Into<String>,
        dance_relative_stem: impl Into<String>,
        segment_description: impl Into<String>,
    ) -> Result<(), TrackError> {
        let id = id.into();
        if self.tracks.contains_key(&id) {
            return Err(TrackError::TrackExists { track_id: id });
        }
        self.tracks.insert(
            id.clone(),
            Track::new(id, dance_relative_stem, segment_description),
        );
        Ok(())
    }

    /// Append a frame to an existing track.
    #[allow(clippy::too_many_arguments)]
    pub fn record_frame(
        &mut self,
        id: &str,
        video_time_secs: f64,
        actual_time_ms: f64,
        user_2d: Pose2D,
        user_3d: Pose3D,
        ref_2d: Pose2D,
        ref_3d: Pose3D,
        metrics: HashMap<LiveMetricKind, MetricFrameResult>,
    ) -> Result<(), TrackError> {
        let track = self
            .tracks
            .get_mut(id)
            .ok_or_else(|| TrackError::TrackNotFound {
                track_id: id.to_string(),
            })?;
        track.record_frame(
            video_time_secs,
            actual_time_ms,
            user_2d,
            user_3d,
            ref_2d,
            ref_3d,
            metrics,
        )
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{unit_vector, FramePair};
    use crate::pose::{PixelLandmark, WorldLandmark, LANDMARK_COUNT};

    fn pose_2d(offset: f64) -> Pose2D {
        let mut arr = [PixelLandmark::new(0.0, 0.0); LANDMARK_COUNT];
        for (i, lm) in arr.iter_mut().enumerate() {
            lm.x = offset + 9.0 * (i as f64);
            lm.y = 250.0 - 4.0 * (i as f64);
        }
        Pose2D(arr)
    }

    fn pose_3d(offset: f64) -> Pose3D {
        let mut arr = [WorldLandmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        for (i, lm) in arr.iter_mut().enumerate() {
            lm.x = offset + 0.1 * (i as f64);
            lm.y = 2.0 - 0.05 * (i as f64);
            lm.z = 0.01 * (i as f64);
        }
        Pose3D(arr)
    }

    fn frame_metrics() -> HashMap<LiveMetricKind, MetricFrameResult> {
        let pose = pose_2d(0.0);
        let mut metrics = HashMap::new();
        metrics.insert(
            LiveMetricKind::UnitVector,
            MetricFrameResult::UnitVector(unit_vector::compute(&pose, &pose)),
        );
        metrics
    }

    fn record(track: &mut Track, video_time: f64) -> Result<(), TrackError> {
        track.record_frame(
            video_time,
            video_time * 1000.0,
            pose_2d(0.0),
            pose_3d(0.0),
            pose_2d(1.0),
            pose_3d(0.1),
            frame_metrics(),
        )
    }

    #[test]
    fn frames_append_in_parallel() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        record(&mut track, 0.0).unwrap();
        record(&mut track, 0.1).unwrap();
        assert_eq!(track.frame_count(), 2);
        assert_eq!(track.user_2d_poses.len(), 2);
        assert_eq!(
            track.metric_series[&LiveMetricKind::UnitVector].len(),
            2
        );
    }

    #[test]
    fn equal_frame_times_are_allowed() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        record(&mut track, 0.2).unwrap();
        record(&mut track, 0.2).unwrap();
        assert_eq!(track.frame_count(), 2);
    }

    #[test]
    fn decreasing_frame_time_is_rejected() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        record(&mut track, 0.5).unwrap();
        let err = record(&mut track, 0.4).unwrap_err();
        match err {
            TrackError::NonMonotonicFrameTime {
                track_id,
                frame_time,
                last_frame_time,
                frame_count,
            } => {
                assert_eq!(track_id, "attempt-1");
                assert_eq!(frame_time, 0.4);
                assert_eq!(last_frame_time, 0.5);
                assert_eq!(frame_count, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Nothing was appended.
        assert_eq!(track.frame_count(), 1);
    }

    #[test]
    fn metric_set_is_fixed_by_the_first_frame() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        record(&mut track, 0.0).unwrap();
        let err = track
            .record_frame(
                0.1,
                100.0,
                pose_2d(0.0),
                pose_3d(0.0),
                pose_2d(1.0),
                pose_3d(0.1),
                HashMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, TrackError::MetricSetMismatch { .. }));
    }

    #[test]
    fn sub_track_slices_the_half_open_range() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        for i in 0..5 {
            record(&mut track, i as f64 * 0.1).unwrap();
        }
        let sub = track.sub_track(0.1, 0.3).unwrap();
        assert_eq!(sub.frame_count(), 2);
        assert!((sub.video_times_secs[0] - 0.1).abs() < 1e-12);
        assert!((sub.video_times_secs[1] - 0.2).abs() < 1e-12);
        assert_eq!(
            sub.metric_series[&LiveMetricKind::UnitVector].len(),
            2
        );
    }

    #[test]
    fn sub_track_past_the_end_clamps() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        for i in 0..3 {
            record(&mut track, i as f64 * 0.1).unwrap();
        }
        let sub = track.sub_track(0.1, 99.0).unwrap();
        assert_eq!(sub.frame_count(), 2);
    }

    #[test]
    fn empty_or_inverted_ranges_yield_no_sub_track() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        for i in 0..3 {
            record(&mut track, i as f64 * 0.1).unwrap();
        }
        assert!(track.sub_track(0.3, 0.1).is_none());
        assert!(track.sub_track(5.0, 6.0).is_none());
        assert!(track.sub_track(0.1, 0.1).is_none());
    }

    #[test]
    fn recorder_enforces_unique_ids_and_existence() {
        let mut recorder = TrackRecorder::new();
        recorder
            .start_track("attempt-1", "dances/renegade", "chorus")
            .unwrap();
        assert!(matches!(
            recorder.start_track("attempt-1", "dances/renegade", "chorus"),
            Err(TrackError::TrackExists { .. })
        ));
        assert!(matches!(
            recorder.record_frame(
                "missing",
                0.0,
                0.0,
                pose_2d(0.0),
                pose_3d(0.0),
                pose_2d(1.0),
                pose_3d(0.1),
                frame_metrics(),
            ),
            Err(TrackError::TrackNotFound { .. })
        ));
    }

    #[test]
    fn tracks_round_trip_through_json() {
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        record(&mut track, 0.0).unwrap();
        record(&mut track, 0.1).unwrap();
        let json = serde_json::to_string(&track).unwrap();
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frame_count(), 2);
        assert_eq!(back.id, "attempt-1");
        assert_eq!(
            back.metric_series[&LiveMetricKind::UnitVector].len(),
            2
        );
    }

    #[test]
    fn frame_pair_metrics_feed_the_track() {
        // The live metric dispatch path used by the evaluator.
        let user_2d = pose_2d(0.0);
        let user_3d = pose_3d(0.0);
        let ref_2d = pose_2d(1.0);
        let ref_3d = pose_3d(0.1);
        let pair = FramePair {
            user_2d: &user_2d,
            user_3d: &user_3d,
            ref_2d: &ref_2d,
            ref_3d: &ref_3d,
        };
        let config = crate::config::EvaluationConfig::default();
        let mut metrics = HashMap::new();
        for kind in LiveMetricKind::ALL {
            metrics.insert(kind, kind.compute(&pair, &config));
        }
        let mut track = Track::new("attempt-1", "dances/renegade", "chorus");
        track
            .record_frame(0.0, 0.0, user_2d, user_3d, ref_2d, ref_3d, metrics)
            .unwrap();
        assert_eq!(track.metric_series.len(), 3);
    }
}
