// Reference choreography data
//
// Precomputed pose frames for a reference dance video, indexed by video
// frame number. Frames may be missing (the estimator can drop frames), so
// lookups resolve to the nearest recorded frame at or before the requested
// time. Times before the first stored frame have no reference pose.

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::pose::{Pose2D, Pose3D};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Which dance this data belongs to
    pub dance_relative_stem: String,
    /// Frame rate of the source video
    pub fps: f64,
    /// Video frame number of each stored pose, strictly increasing
    frame_indices: Vec<u32>,
    poses_2d: Vec<Pose2D>,
    poses_3d: Vec<Pose3D>,
}

impl ReferenceData {
    /// Build reference data from parallel arrays.
    pub fn new(
        dance_relative_stem: impl Into<String>,
        fps: f64,
        frame_indices: Vec<u32>,
        poses_2d: Vec<Pose2D>,
        poses_3d: Vec<Pose3D>,
    ) -> Result<Self, TrackError> {
        if poses_2d.len() != frame_indices.len() {
            return Err(TrackError::MismatchedLengths {
                expected: frame_indices.len(),
                actual: poses_2d.len(),
            });
        }
        if poses_3d.len() != frame_indices.len() {
            return Err(TrackError::MismatchedLengths {
                expected: frame_indices.len(),
                actual: poses_3d.len(),
            });
        }
        Ok(Self {
            dance_relative_stem: dance_relative_stem.into(),
            fps,
            frame_indices,
            poses_2d,
            poses_3d,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_indices.len()
    }

    /// The stored poses nearest at-or-before the given video time.
    ///
    /// A time past the end resolves to the last frame; a time before the
    /// first stored frame has no pose (`None`), so callers skip the frame.
    pub fn poses_at_time(&self, video_time_secs: f64) -> Option<(&Pose2D, &Pose3D)> {
        let target = (video_time_secs * self.fps).floor() as i64;
        // Index of the first stored frame past the target.
        let after = self
            .frame_indices
            .partition_point(|index| (*index as i64) <= target);
        let index = after.checked_sub(1)?;
        Some((&self.poses_2d[index], &self.poses_3d[index]))
    }

    /// Resolve a whole array of frame times, dropping times that have no
    /// reference data.
    pub fn poses_at_times(&self, frame_times_secs: &[f64]) -> Vec<(&Pose2D, &Pose3D)> {
        frame_times_secs
            .iter()
            .filter_map(|t| self.poses_at_time(*t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{PixelLandmark, WorldLandmark, LANDMARK_COUNT};

    fn pose_2d(tag: f64) -> Pose2D {
        let mut arr = [PixelLandmark::new(0.0, 0.0); LANDMARK_COUNT];
        arr[0].x = tag;
        Pose2D(arr)
    }

    fn pose_3d(tag: f64) -> Pose3D {
        let mut arr = [WorldLandmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        arr[0].x = tag;
        Pose3D(arr)
    }

    fn reference_with_frames(frame_indices: Vec<u32>) -> ReferenceData {
        let poses_2d = frame_indices.iter().map(|i| pose_2d(*i as f64)).collect();
        let poses_3d = frame_indices.iter().map(|i| pose_3d(*i as f64)).collect();
        ReferenceData::new("dances/renegade", 30.0, frame_indices, poses_2d, poses_3d).unwrap()
    }

    #[test]
    fn exact_frame_times_resolve_to_their_frame() {
        let reference = reference_with_frames(vec![0, 1, 2, 3]);
        // Frame 2 starts at 2/30 seconds.
        let (pose, _) = reference.poses_at_time(2.0 / 30.0).unwrap();
        assert_eq!(pose.0[0].x, 2.0);
    }

    #[test]
    fn missing_frames_resolve_to_the_nearest_earlier_one() {
        let reference = reference_with_frames(vec![0, 1, 5, 9]);
        // Frame 3 is missing; frame 1 is the nearest at-or-before.
        let (pose, _) = reference.poses_at_time(3.0 / 30.0).unwrap();
        assert_eq!(pose.0[0].x, 1.0);
    }

    #[test]
    fn times_before_the_data_have_no_pose() {
        let reference = reference_with_frames(vec![4, 5, 6]);
        assert!(reference.poses_at_time(0.0).is_none());
        // Frame 4 starts at 4/30 seconds and is the first available pose.
        let (pose, _) = reference.poses_at_time(4.0 / 30.0).unwrap();
        assert_eq!(pose.0[0].x, 4.0);
    }

    #[test]
    fn times_past_the_end_clamp_to_the_last_frame() {
        let reference = reference_with_frames(vec![0, 1, 2]);
        let (pose, _) = reference.poses_at_time(100.0).unwrap();
        assert_eq!(pose.0[0].x, 2.0);
    }

    #[test]
    fn empty_reference_data_has_no_poses() {
        let reference = reference_with_frames(vec![]);
        assert!(reference.poses_at_time(0.0).is_none());
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let result = ReferenceData::new(
            "dances/renegade",
            30.0,
            vec![0, 1],
            vec![pose_2d(0.0)],
            vec![pose_3d(0.0), pose_3d(1.0)],
        );
        assert!(matches!(
            result,
            Err(TrackError::MismatchedLengths { expected: 2, actual: 1 })
        ));
    }
}
