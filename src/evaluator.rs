// Performance evaluator
//
// Drives the whole per-attempt pipeline: resolve the reference poses for
// each incoming frame, run the live metrics, append everything to the
// attempt's track, and reduce finished tracks into attempt summaries.

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::config::EvaluationConfig;
use crate::error::{log_metric_error, log_track_error, EvaluationError, TrackError};
use crate::metrics::{
    FramePair, LiveMetricKind, MetricFrameResult, MetricSummary, SummaryMetricKind,
    SummaryMetricResult,
};
use crate::pose::{Pose2D, Pose3D};
use crate::reference::ReferenceData;
use crate::summary::{vector_highlights, VectorHighlights};
use crate::track::{Track, TrackRecorder};

/// Everything known about one finished attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub track_id: String,
    pub segment_description: String,
    /// One summary per live metric recorded on the track, in a stable order
    pub live_metrics: Vec<MetricSummary>,
    /// Worst/outlier comparison vectors per live metric
    pub highlights: Vec<(LiveMetricKind, VectorHighlights)>,
    /// Whole-track summary metrics; unavailable ones are omitted
    pub summary_metrics: Vec<SummaryMetricResult>,
}

impl AttemptSummary {
    /// Flatten into namespaced columns for tabular export.
    pub fn format_rows(&self) -> Vec<(String, Value)> {
        let mut rows = Vec::new();
        for summary in &self.live_metrics {
            for (column, value) in summary.format() {
                rows.push((format!("{}.{}", summary.metric.name(), column), Value::from(value)));
            }
        }
        for result in &self.summary_metrics {
            for (column, value) in result.format() {
                rows.push((format!("{}.{}", result.kind().name(), column), value));
            }
        }
        rows
    }
}

/// Evaluates a learner's performance against one dance's reference data.
pub struct Evaluator {
    pub reference: ReferenceData,
    pub recorder: TrackRecorder,
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(reference: ReferenceData, config: EvaluationConfig) -> Self {
        Self {
            reference,
            recorder: TrackRecorder::new(),
            config,
        }
    }

    /// Open a track for a new attempt at a segment.
    pub fn start_attempt(
        &mut self,
        id: impl Into<String>,
        segment_description: impl Into<String>,
    ) -> Result<(), TrackError> {
        let id = id.into();
        info!("Starting attempt track {}", id);
        let stem = self.reference.dance_relative_stem.clone();
        self.recorder.start_track(id, stem, segment_description)
    }

    /// Evaluate and record one captured frame.
    ///
    /// Returns the live metric results for the frame, or `Ok(None)` when no
    /// reference pose exists for the frame time (the frame is skipped, not
    /// recorded).
    pub fn evaluate_frame(
        &mut self,
        id: &str,
        video_time_secs: f64,
        actual_time_ms: f64,
        user_2d: Pose2D,
        user_3d: Pose3D,
    ) -> Result<Option<HashMap<LiveMetricKind, MetricFrameResult>>, TrackError> {
        let (ref_2d, ref_3d) = match self.reference.poses_at_time(video_time_secs) {
            Some(poses) => poses,
            None => {
                debug!(
                    "No reference pose at t={:.3}s; skipping frame for track {}",
                    video_time_secs, id
                );
                return Ok(None);
            }
        };
        let ref_2d = ref_2d.clone();
        let ref_3d = ref_3d.clone();

        let pair = FramePair {
            user_2d: &user_2d,
            user_3d: &user_3d,
            ref_2d: &ref_2d,
            ref_3d: &ref_3d,
        };
        let mut metrics = HashMap::with_capacity(LiveMetricKind::ALL.len());
        for kind in LiveMetricKind::ALL {
            metrics.insert(kind, kind.compute(&pair, &self.config));
        }

        if let Err(err) = self.recorder.record_frame(
            id,
            video_time_secs,
            actual_time_ms,
            user_2d,
            user_3d,
            ref_2d,
            ref_3d,
            metrics.clone(),
        ) {
            log_track_error(&err, "evaluate_frame");
            return Err(err);
        }
        Ok(Some(metrics))
    }

    /// Summarize a finished attempt's whole track.
    pub fn summarize_attempt(&self, id: &str) -> Result<AttemptSummary, EvaluationError> {
        let track = self
            .recorder
            .track(id)
            .ok_or_else(|| TrackError::TrackNotFound {
                track_id: id.to_string(),
            })?;
        self.summarize_track(track)
    }

    /// Summarize a slice of an attempt, e.g. one practiced segment.
    pub fn summarize_attempt_range(
        &self,
        id: &str,
        video_start_secs: f64,
        video_end_secs: f64,
    ) -> Result<Option<AttemptSummary>, EvaluationError> {
        let track = self
            .recorder
            .track(id)
            .ok_or_else(|| TrackError::TrackNotFound {
                track_id: id.to_string(),
            })?;
        match track.sub_track(video_start_secs, video_end_secs) {
            Some(sub) => self.summarize_track(&sub).map(Some),
            None => Ok(None),
        }
    }

    pub fn summarize_track(&self, track: &Track) -> Result<AttemptSummary, EvaluationError> {
        summarize_track(track, &self.config)
    }
}

/// Reduce a recorded track into an attempt summary. Works on any track,
/// including ones loaded back from disk.
pub fn summarize_track(
    track: &Track,
    config: &EvaluationConfig,
) -> Result<AttemptSummary, EvaluationError> {
    let mut live_metrics = Vec::new();
    let mut highlights = Vec::new();
    for kind in LiveMetricKind::ALL {
        let Some(series) = track.metric_series.get(&kind) else {
            continue;
        };
        if let Some(summary) = kind.summarize(series) {
            highlights.push((kind, vector_highlights(&summary, config)));
            live_metrics.push(summary);
        }
    }

    let history = track.history();
    let mut summary_metrics = Vec::new();
    for kind in SummaryMetricKind::ALL {
        match kind.summarize(&history, config) {
            Ok(Some(result)) => summary_metrics.push(result),
            Ok(None) => {}
            Err(err) => {
                log_metric_error(&err, kind.name());
                return Err(err.into());
            }
        }
    }

    Ok(AttemptSummary {
        track_id: track.id.clone(),
        segment_description: track.segment_description.clone(),
        live_metrics,
        highlights,
        summary_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{PixelLandmark, WorldLandmark, LANDMARK_COUNT};

    fn pose_2d(step: f64) -> Pose2D {
        let mut arr = [PixelLandmark::new(0.0, 0.0); LANDMARK_COUNT];
        for (i, lm) in arr.iter_mut().enumerate() {
            lm.x = step + 12.0 * (i as f64);
            lm.y = 350.0 - 6.0 * (i as f64);
        }
        Pose2D(arr)
    }

    fn pose_3d(step: f64) -> Pose3D {
        let mut arr = [WorldLandmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        for (i, lm) in arr.iter_mut().enumerate() {
            lm.x = step + 0.1 * (i as f64);
            lm.y = 2.0 - 0.05 * (i as f64);
            lm.z = 0.02 * ((i % 5) as f64);
        }
        Pose3D(arr)
    }

    fn evaluator(frames: u32) -> Evaluator {
        let frame_indices: Vec<u32> = (0..frames).collect();
        let poses_2d = frame_indices
            .iter()
            .map(|i| pose_2d(*i as f64 * 2.0))
            .collect();
        let poses_3d = frame_indices
            .iter()
            .map(|i| pose_3d(*i as f64 * 0.05))
            .collect();
        let reference = ReferenceData::new(
            "dances/renegade",
            30.0,
            frame_indices,
            poses_2d,
            poses_3d,
        )
        .unwrap();
        Evaluator::new(reference, EvaluationConfig::default())
    }

    fn run_attempt(evaluator: &mut Evaluator, id: &str, frames: u32) {
        evaluator.start_attempt(id, "chorus").unwrap();
        for i in 0..frames {
            let t = i as f64 / 30.0;
            let results = evaluator
                .evaluate_frame(id, t, t * 1000.0, pose_2d(i as f64 * 2.0), pose_3d(i as f64 * 0.05))
                .unwrap();
            assert!(results.is_some());
        }
    }

    #[test]
    fn frames_are_scored_and_recorded() {
        let mut evaluator = evaluator(10);
        run_attempt(&mut evaluator, "attempt-1", 10);
        let track = evaluator.recorder.track("attempt-1").unwrap();
        assert_eq!(track.frame_count(), 10);
        assert_eq!(track.metric_series.len(), LiveMetricKind::ALL.len());
    }

    #[test]
    fn matching_the_reference_scores_perfectly() {
        let mut evaluator = evaluator(10);
        run_attempt(&mut evaluator, "attempt-1", 10);
        let summary = evaluator.summarize_attempt("attempt-1").unwrap();

        let unit_vector = summary
            .live_metrics
            .iter()
            .find(|s| s.metric == LiveMetricKind::UnitVector)
            .unwrap();
        assert!((unit_vector.overall_score - 5.0).abs() < 1e-9);

        let blended = summary
            .live_metrics
            .iter()
            .find(|s| s.metric == LiveMetricKind::Blended)
            .unwrap();
        assert!(blended.overall_score.abs() < 1e-9);
    }

    #[test]
    fn summaries_include_whole_track_metrics() {
        let mut evaluator = evaluator(12);
        run_attempt(&mut evaluator, "attempt-1", 12);
        let summary = evaluator.summarize_attempt("attempt-1").unwrap();
        let kinds: Vec<SummaryMetricKind> =
            summary.summary_metrics.iter().map(|m| m.kind()).collect();
        assert!(kinds.contains(&SummaryMetricKind::KinematicError));
        assert!(kinds.contains(&SummaryMetricKind::AngleDtw));
        assert!(kinds.contains(&SummaryMetricKind::TemporalOffset));
        assert!(kinds.contains(&SummaryMetricKind::BasicInfo));
    }

    #[test]
    fn format_rows_namespaces_columns_by_metric() {
        let mut evaluator = evaluator(8);
        run_attempt(&mut evaluator, "attempt-1", 8);
        let summary = evaluator.summarize_attempt("attempt-1").unwrap();
        let rows = summary.format_rows();
        let columns: Vec<&str> = rows.iter().map(|(name, _)| name.as_str()).collect();
        assert!(columns.contains(&"unit_vector_similarity.overall"));
        assert!(columns.contains(&"kinematic_error.vels_mae"));
        assert!(columns.contains(&"basic_info.pose_frame_count"));
    }

    #[test]
    fn range_summaries_slice_the_track() {
        let mut evaluator = evaluator(30);
        run_attempt(&mut evaluator, "attempt-1", 30);
        let summary = evaluator
            .summarize_attempt_range("attempt-1", 0.2, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(summary.track_id, "attempt-1");
        // An empty range has no summary.
        assert!(evaluator
            .summarize_attempt_range("attempt-1", 5.0, 6.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn unknown_attempts_are_an_error() {
        let mut evaluator = evaluator(5);
        run_attempt(&mut evaluator, "attempt-1", 5);
        assert!(matches!(
            evaluator.summarize_attempt("missing"),
            Err(EvaluationError::Track(TrackError::TrackNotFound { .. }))
        ));
    }
}
