// Pose module - landmark model, frame types, vector math, comparison sets

pub mod comparisons;
pub mod frame;
pub mod landmark;
pub mod math;

pub use comparisons::{
    AngleComparison, BodyPart, ANGLE_COMPARISONS, ANGLE_COMPARISON_COUNT,
    COMPARISON_VECTORS, COMPARISON_VECTOR_BODY_PARTS, COMPARISON_VECTOR_COUNT,
    COMPARISON_VECTOR_NAMES,
};
pub use frame::{PixelLandmark, Pose2D, Pose3D, WorldLandmark};
pub use landmark::{Landmark, LANDMARK_COUNT};
pub use math::{
    arithmetic_mean, geometric_mean, harmonic_mean, harmonic_mean_filtered, inner_angle_2d,
    inner_angle_3d, inner_angle_from_frame, lerp, magnitude_2d, magnitude_3d, mean_filtered,
    normalized_2d, normalized_3d, normalized_segment_2d, p_norm, p_norm_average,
    scale_indicator_2d, scale_indicator_3d, segment_2d, segment_3d, std_dev,
};
