// Pose frame data structures
//
// A frame is a fixed-length ordered list of landmark positions, produced by
// the external pose-estimation service. 2D frames are in pixel space with an
// approximate distance-from-camera channel; 3D frames are in an approximately
// metric, camera-relative space.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::landmark::{Landmark, LANDMARK_COUNT};

/// One landmark position in 2D pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelLandmark {
    /// Horizontal position in pixels
    pub x: f64,
    /// Vertical position in pixels
    pub y: f64,
    /// Approximate distance from the camera (same scale as x/y)
    pub dist_from_camera: f64,
    /// Estimated landmark visibility (0.0-1.0), if reported
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl PixelLandmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            dist_from_camera: 0.0,
            visibility: None,
        }
    }
}

/// One landmark position in camera-relative 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldLandmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Estimated landmark visibility (0.0-1.0), if reported
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl WorldLandmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }
}

/// A full-body 2D pose: 33 pixel landmarks in the fixed frame order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose2D(pub [PixelLandmark; LANDMARK_COUNT]);

/// A full-body 3D pose: 33 world landmarks in the fixed frame order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose3D(pub [WorldLandmark; LANDMARK_COUNT]);

impl Pose2D {
    pub fn get(&self, landmark: Landmark) -> &PixelLandmark {
        &self.0[landmark.index()]
    }

    /// True if the frame carries usable coordinates (the estimation service
    /// reports NaN positions when tracking is lost).
    pub fn is_valid(&self) -> bool {
        let first = &self.0[0];
        first.x.is_finite() && first.y.is_finite()
    }
}

impl Pose3D {
    pub fn get(&self, landmark: Landmark) -> &WorldLandmark {
        &self.0[landmark.index()]
    }

    pub fn is_valid(&self) -> bool {
        let first = &self.0[0];
        first.x.is_finite() && first.y.is_finite() && first.z.is_finite()
    }
}

// Serde for fixed-length frames goes through a Vec with a length check, since
// a 33-element array has no derived impl.

impl Serialize for Pose2D {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pose2D {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<PixelLandmark>::deserialize(deserializer)?;
        let len = entries.len();
        let arr: [PixelLandmark; LANDMARK_COUNT] = entries
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"exactly 33 landmarks"))?;
        Ok(Pose2D(arr))
    }
}

impl Serialize for Pose3D {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pose3D {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<WorldLandmark>::deserialize(deserializer)?;
        let len = entries.len();
        let arr: [WorldLandmark; LANDMARK_COUNT] = entries
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"exactly 33 landmarks"))?;
        Ok(Pose3D(arr))
    }
}
