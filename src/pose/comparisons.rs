// Comparison vector definitions
//
// Two fixed sets drive the similarity metrics:
// - COMPARISON_VECTORS: 8 upper-body segments compared directly in 2D
// - ANGLE_COMPARISONS: 7 named joint-angle comparisons in 3D, each with a
//   declared range of motion used to scale angle differences

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::landmark::Landmark;

/// Number of upper-body comparison vectors.
pub const COMPARISON_VECTOR_COUNT: usize = 8;

/// The 8 upper-body comparison vectors: shoulder girdle, torso sides,
/// hip line, and both arms.
pub const COMPARISON_VECTORS: [(Landmark, Landmark); COMPARISON_VECTOR_COUNT] = [
    (Landmark::LeftShoulder, Landmark::RightShoulder),
    (Landmark::LeftShoulder, Landmark::LeftHip),
    (Landmark::LeftHip, Landmark::RightHip),
    (Landmark::RightHip, Landmark::RightShoulder),
    (Landmark::LeftShoulder, Landmark::LeftElbow),
    (Landmark::LeftElbow, Landmark::LeftWrist),
    (Landmark::RightShoulder, Landmark::RightElbow),
    (Landmark::RightElbow, Landmark::RightWrist),
];

/// Display names for the comparison vectors, in the same order.
pub static COMPARISON_VECTOR_NAMES: Lazy<[String; COMPARISON_VECTOR_COUNT]> = Lazy::new(|| {
    COMPARISON_VECTORS.map(|(src, dst)| format!("{} -> {}", src.name(), dst.name()))
});

/// Coarse body regions used when reporting a bad comparison vector back to
/// feedback consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Torso,
    LeftArm,
    RightArm,
}

/// Body region of each comparison vector, in the same order.
pub const COMPARISON_VECTOR_BODY_PARTS: [BodyPart; COMPARISON_VECTOR_COUNT] = [
    BodyPart::Torso,    // left_shoulder -> right_shoulder
    BodyPart::Torso,    // left_shoulder -> left_hip
    BodyPart::Torso,    // left_hip -> right_hip
    BodyPart::Torso,    // right_hip -> right_shoulder
    BodyPart::LeftArm,  // left_shoulder -> left_elbow
    BodyPart::LeftArm,  // left_elbow -> left_wrist
    BodyPart::RightArm, // right_shoulder -> right_elbow
    BodyPart::RightArm, // right_elbow -> right_wrist
];

/// One named 3D joint-angle comparison: the inner angle between `vec1` and
/// `vec2`, with angle differences scaled by the joint's range of motion.
#[derive(Debug, Clone, Copy)]
pub struct AngleComparison {
    pub name: &'static str,
    pub vec1: (Landmark, Landmark),
    pub vec2: (Landmark, Landmark),
    /// Maximum plausible angle excursion for this joint, in radians.
    pub range_of_motion: f64,
}

/// Number of named joint-angle comparisons.
pub const ANGLE_COMPARISON_COUNT: usize = 7;

/// The 7 named joint-angle comparisons used by the 3D similarity metric.
pub const ANGLE_COMPARISONS: [AngleComparison; ANGLE_COMPARISON_COUNT] = [
    AngleComparison {
        name: "left-elbow-bend",
        vec1: (Landmark::LeftElbow, Landmark::LeftShoulder),
        vec2: (Landmark::LeftElbow, Landmark::LeftWrist),
        range_of_motion: PI * 5.0 / 6.0,
    },
    AngleComparison {
        name: "right-elbow-bend",
        vec1: (Landmark::RightElbow, Landmark::RightShoulder),
        vec2: (Landmark::RightElbow, Landmark::RightWrist),
        range_of_motion: PI * 5.0 / 6.0,
    },
    AngleComparison {
        name: "left-shoulder-raise",
        vec1: (Landmark::LeftShoulder, Landmark::LeftHip),
        vec2: (Landmark::LeftShoulder, Landmark::LeftElbow),
        range_of_motion: PI,
    },
    AngleComparison {
        name: "right-shoulder-raise",
        vec1: (Landmark::RightShoulder, Landmark::RightHip),
        vec2: (Landmark::RightShoulder, Landmark::RightElbow),
        range_of_motion: PI,
    },
    AngleComparison {
        name: "left-knee-bend",
        vec1: (Landmark::LeftKnee, Landmark::LeftHip),
        vec2: (Landmark::LeftKnee, Landmark::LeftAnkle),
        range_of_motion: PI * 5.0 / 6.0,
    },
    AngleComparison {
        name: "right-knee-bend",
        vec1: (Landmark::RightKnee, Landmark::RightHip),
        vec2: (Landmark::RightKnee, Landmark::RightAnkle),
        range_of_motion: PI * 5.0 / 6.0,
    },
    AngleComparison {
        name: "hip-hinge",
        vec1: (Landmark::LeftHip, Landmark::LeftShoulder),
        vec2: (Landmark::LeftHip, Landmark::LeftKnee),
        range_of_motion: PI / 2.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_vector_names_follow_landmark_names() {
        assert_eq!(
            COMPARISON_VECTOR_NAMES[0],
            "left_shoulder -> right_shoulder"
        );
        assert_eq!(COMPARISON_VECTOR_NAMES[7], "right_elbow -> right_wrist");
    }

    #[test]
    fn angle_comparison_names_are_unique() {
        let mut names: Vec<&str> = ANGLE_COMPARISONS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ANGLE_COMPARISON_COUNT);
    }

    #[test]
    fn ranges_of_motion_are_positive() {
        for cmp in &ANGLE_COMPARISONS {
            assert!(cmp.range_of_motion > 0.0, "{}", cmp.name);
        }
    }
}
