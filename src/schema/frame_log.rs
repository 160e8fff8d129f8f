//! motion.frame.v1 schema definition
//!
//! Detector-agnostic schema for recorded landmark frames: one JSON object
//! per frame tick with an epoch-millisecond timestamp and the named
//! landmarks the detector produced. Works for pose and hand recordings
//! alike; the landmark vocabulary decides which pipeline can consume it.

use crate::types::{Landmark, LandmarkName, Observation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current frame-log schema version
pub const FRAME_SCHEMA_VERSION: &str = "motion.frame.v1";

/// Detector provenance for a recorded frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedSource {
    /// Detector family (e.g., "movenet", "handpose")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector: Option<String>,
    /// Model variant or version string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One landmark as the detector recorded it.
///
/// `confidence` also deserializes from `score`, the field name most
/// pose-detection runtimes emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedLandmark {
    pub name: LandmarkName,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(alias = "score")]
    pub confidence: f64,
}

/// One recorded frame in the motion.frame.v1 schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Schema version identifier; absent in minimal recordings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Frame timestamp as epoch milliseconds (UTC)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Detector provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RecordedSource>,
    pub landmarks: Vec<RecordedLandmark>,
}

impl RecordedFrame {
    pub fn new(timestamp: DateTime<Utc>, landmarks: Vec<RecordedLandmark>) -> Self {
        Self {
            schema: Some(FRAME_SCHEMA_VERSION.to_string()),
            timestamp,
            source: None,
            landmarks,
        }
    }

    /// Attach detector provenance
    pub fn with_source(mut self, source: RecordedSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Validate the frame against the schema.
    ///
    /// A missing schema field is accepted; a present one must match
    /// [`FRAME_SCHEMA_VERSION`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(schema) = &self.schema {
            if schema != FRAME_SCHEMA_VERSION {
                return Err(ValidationError::SchemaMismatch {
                    expected: FRAME_SCHEMA_VERSION.to_string(),
                    actual: schema.clone(),
                });
            }
        }

        if self.landmarks.is_empty() {
            return Err(ValidationError::EmptyLandmarks);
        }

        for landmark in &self.landmarks {
            let coordinates_finite = landmark.x.is_finite()
                && landmark.y.is_finite()
                && landmark.z.map_or(true, f64::is_finite);
            if !coordinates_finite {
                return Err(ValidationError::NonFiniteCoordinate {
                    landmark: landmark.name.as_str().to_string(),
                });
            }
            if !(0.0..=1.0).contains(&landmark.confidence) {
                return Err(ValidationError::ConfidenceOutOfRange {
                    landmark: landmark.name.as_str().to_string(),
                    confidence: landmark.confidence,
                });
            }
        }

        Ok(())
    }

    /// Convert to an observation, repairing landmark-level noise.
    ///
    /// Landmarks with non-finite coordinates are dropped and confidence is
    /// clamped to [0, 1]; downstream extraction degrades gracefully when a
    /// repaired frame comes up short.
    pub fn to_observation(&self) -> Observation {
        let landmarks = self
            .landmarks
            .iter()
            .filter(|l| {
                l.x.is_finite() && l.y.is_finite() && l.z.map_or(true, f64::is_finite)
            })
            .map(|l| Landmark {
                name: l.name.clone(),
                x: l.x,
                y: l.y,
                z: l.z,
                confidence: l.confidence.clamp(0.0, 1.0),
            })
            .collect();

        Observation::new(self.timestamp, landmarks)
    }
}

/// Validation errors for recorded frames
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported frame schema: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Frame holds no landmarks")]
    EmptyLandmarks,

    #[error("Landmark {landmark} has a non-finite coordinate")]
    NonFiniteCoordinate { landmark: String },

    #[error("Landmark {landmark} confidence {confidence} is outside [0, 1]")]
    ConfidenceOutOfRange { landmark: String, confidence: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_landmark(name: LandmarkName, x: f64, confidence: f64) -> RecordedLandmark {
        RecordedLandmark {
            name,
            x,
            y: 50.0,
            z: None,
            confidence,
        }
    }

    #[test]
    fn test_serialize_frame() {
        let frame = RecordedFrame::new(
            Utc.timestamp_millis_opt(1_500).single().unwrap(),
            vec![make_landmark(LandmarkName::ThumbTip, 10.0, 0.9)],
        )
        .with_source(RecordedSource {
            detector: Some("handpose".to_string()),
            model: None,
        });

        let json = serde_json::to_string(&frame).unwrap();

        assert!(json.contains("motion.frame.v1"));
        assert!(json.contains("thumb_tip"));
        assert!(json.contains("\"timestamp\":1500"));
        assert!(json.contains("handpose"));
    }

    #[test]
    fn test_deserialize_frame_with_score_alias() {
        let json = r#"{
            "timestamp": 1000,
            "landmarks": [
                {"name": "nose", "x": 100.0, "y": 50.0, "score": 0.87}
            ]
        }"#;

        let frame: RecordedFrame = serde_json::from_str(json).unwrap();

        assert!(frame.schema.is_none());
        assert_eq!(frame.landmarks.len(), 1);
        assert!((frame.landmarks[0].confidence - 0.87).abs() < 1e-9);
        assert!(frame.landmarks[0].z.is_none());
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_schema() {
        let mut frame = RecordedFrame::new(
            Utc.timestamp_millis_opt(0).single().unwrap(),
            vec![make_landmark(LandmarkName::Nose, 100.0, 0.9)],
        );
        frame.schema = Some("motion.frame.v2".to_string());

        assert!(matches!(
            frame.validate(),
            Err(ValidationError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_landmarks() {
        let frame = RecordedFrame::new(Utc.timestamp_millis_opt(0).single().unwrap(), vec![]);

        assert!(matches!(
            frame.validate(),
            Err(ValidationError::EmptyLandmarks)
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_coordinate() {
        let frame = RecordedFrame::new(
            Utc.timestamp_millis_opt(0).single().unwrap(),
            vec![make_landmark(LandmarkName::Nose, f64::NAN, 0.9)],
        );

        assert!(matches!(
            frame.validate(),
            Err(ValidationError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let frame = RecordedFrame::new(
            Utc.timestamp_millis_opt(0).single().unwrap(),
            vec![make_landmark(LandmarkName::Nose, 100.0, 1.5)],
        );

        assert!(matches!(
            frame.validate(),
            Err(ValidationError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_to_observation_repairs_noise() {
        let frame = RecordedFrame::new(
            Utc.timestamp_millis_opt(250).single().unwrap(),
            vec![
                make_landmark(LandmarkName::Nose, f64::INFINITY, 0.9),
                make_landmark(LandmarkName::LeftAnkle, 90.0, 1.2),
            ],
        );

        let observation = frame.to_observation();

        assert_eq!(observation.landmarks.len(), 1);
        assert_eq!(observation.landmarks[0].name, LandmarkName::LeftAnkle);
        assert!((observation.landmarks[0].confidence - 1.0).abs() < 1e-9);
        assert_eq!(observation.timestamp.timestamp_millis(), 250);
    }
}
