//! Core types for the Kinemetry pipelines
//!
//! This module defines the data that flows into both assessment pipelines:
//! named landmarks produced by an external pose/hand detector, per-frame
//! observations, and the static normal-range reference table used for
//! display-side classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named landmark vocabulary shared by the pose and hand detectors.
///
/// Pose names follow the 17-point skeleton vocabulary; hand names follow the
/// 21-point hand vocabulary. Detector extensions outside the fixed vocabulary
/// deserialize as `Other` and pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkName {
    // Pose
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    // Hand
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
    /// For detector-specific landmarks outside the fixed vocabulary
    #[serde(untagged)]
    Other(String),
}

impl LandmarkName {
    pub fn as_str(&self) -> &str {
        match self {
            LandmarkName::Nose => "nose",
            LandmarkName::LeftEye => "left_eye",
            LandmarkName::RightEye => "right_eye",
            LandmarkName::LeftEar => "left_ear",
            LandmarkName::RightEar => "right_ear",
            LandmarkName::LeftShoulder => "left_shoulder",
            LandmarkName::RightShoulder => "right_shoulder",
            LandmarkName::LeftElbow => "left_elbow",
            LandmarkName::RightElbow => "right_elbow",
            LandmarkName::LeftWrist => "left_wrist",
            LandmarkName::RightWrist => "right_wrist",
            LandmarkName::LeftHip => "left_hip",
            LandmarkName::RightHip => "right_hip",
            LandmarkName::LeftKnee => "left_knee",
            LandmarkName::RightKnee => "right_knee",
            LandmarkName::LeftAnkle => "left_ankle",
            LandmarkName::RightAnkle => "right_ankle",
            LandmarkName::Wrist => "wrist",
            LandmarkName::ThumbCmc => "thumb_cmc",
            LandmarkName::ThumbMcp => "thumb_mcp",
            LandmarkName::ThumbIp => "thumb_ip",
            LandmarkName::ThumbTip => "thumb_tip",
            LandmarkName::IndexFingerMcp => "index_finger_mcp",
            LandmarkName::IndexFingerPip => "index_finger_pip",
            LandmarkName::IndexFingerDip => "index_finger_dip",
            LandmarkName::IndexFingerTip => "index_finger_tip",
            LandmarkName::MiddleFingerMcp => "middle_finger_mcp",
            LandmarkName::MiddleFingerPip => "middle_finger_pip",
            LandmarkName::MiddleFingerDip => "middle_finger_dip",
            LandmarkName::MiddleFingerTip => "middle_finger_tip",
            LandmarkName::RingFingerMcp => "ring_finger_mcp",
            LandmarkName::RingFingerPip => "ring_finger_pip",
            LandmarkName::RingFingerDip => "ring_finger_dip",
            LandmarkName::RingFingerTip => "ring_finger_tip",
            LandmarkName::PinkyMcp => "pinky_mcp",
            LandmarkName::PinkyPip => "pinky_pip",
            LandmarkName::PinkyDip => "pinky_dip",
            LandmarkName::PinkyTip => "pinky_tip",
            LandmarkName::Other(name) => name.as_str(),
        }
    }
}

/// A 3D point in frame-source units (z is zero for 2D detectors)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One named detector keypoint with its confidence score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    /// Landmark name from the fixed vocabulary
    pub name: LandmarkName,
    /// Horizontal coordinate (frame-source units)
    pub x: f64,
    /// Vertical coordinate (frame-source units)
    pub y: f64,
    /// Depth coordinate, when the detector provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

impl Landmark {
    pub fn new(name: LandmarkName, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            name,
            x,
            y,
            z: None,
            confidence,
        }
    }

    /// Position as a 3D point, z defaulting to zero for 2D detectors
    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z.unwrap_or(0.0))
    }
}

/// One frame's full landmark set, as delivered by the frame source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Frame timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// All landmarks detected in this frame
    pub landmarks: Vec<Landmark>,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp,
            landmarks,
        }
    }

    /// Look up a landmark by name
    pub fn landmark(&self, name: &LandmarkName) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| &l.name == name)
    }

    /// Look up a landmark by name, treating low confidence as absent
    pub fn confident_landmark(&self, name: &LandmarkName, min_confidence: f64) -> Option<&Landmark> {
        self.landmark(name).filter(|l| l.confidence >= min_confidence)
    }

    /// Milliseconds elapsed since a previous observation (negative when earlier)
    pub fn delta_ms(&self, previous: &Observation) -> f64 {
        let delta = self.timestamp - previous.timestamp;
        match delta.num_microseconds() {
            Some(us) => us as f64 / 1000.0,
            None => delta.num_milliseconds() as f64,
        }
    }
}

/// Classification of a value against a normal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Below,
    Within,
    Above,
}

/// Static reference range for one displayed metric.
///
/// Used only for display-side classification in reports; the core never
/// enforces these bounds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NormalRange {
    pub metric: &'static str,
    pub low: f64,
    pub high: f64,
    pub unit: &'static str,
}

impl NormalRange {
    pub fn classify(&self, value: f64) -> RangeStatus {
        if value < self.low {
            RangeStatus::Below
        } else if value > self.high {
            RangeStatus::Above
        } else {
            RangeStatus::Within
        }
    }
}

/// Reference ranges for finger-tapping metrics.
///
/// The amplitude range assumes a millimeter-calibrated hand stream; for
/// uncalibrated pixel streams the finding is still reported but reflects
/// pixel units.
pub const TAP_NORMAL_RANGES: &[NormalRange] = &[
    NormalRange {
        metric: "tap_frequency",
        low: 3.5,
        high: 5.5,
        unit: "taps/sec",
    },
    NormalRange {
        metric: "tap_amplitude",
        low: 30.0,
        high: 50.0,
        unit: "mm",
    },
    NormalRange {
        metric: "rhythm_regularity",
        low: 85.0,
        high: 100.0,
        unit: "%",
    },
    NormalRange {
        metric: "movement_precision",
        low: 90.0,
        high: 100.0,
        unit: "%",
    },
];
