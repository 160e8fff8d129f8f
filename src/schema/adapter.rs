//! Adapter for converting recorded frame logs to observations
//!
//! Handles both NDJSON (one frame per line, streaming recordings) and JSON
//! array exports, validates frames, and produces the chronologically ordered
//! observation sequence the session loop replays.

use crate::error::AnalysisError;
use crate::schema::frame_log::{RecordedFrame, ValidationError, FRAME_SCHEMA_VERSION};
use crate::types::Observation;

/// Adapter for recorded motion.frame.v1 logs
pub struct FrameLogAdapter;

impl FrameLogAdapter {
    /// Parse a JSON string containing an array of recorded frames
    pub fn parse_array(json: &str) -> Result<Vec<RecordedFrame>, AnalysisError> {
        let frames: Vec<RecordedFrame> = serde_json::from_str(json)?;
        Ok(frames)
    }

    /// Parse NDJSON (newline-delimited JSON) containing recorded frames
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RecordedFrame>, AnalysisError> {
        let mut frames = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RecordedFrame>(trimmed) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    return Err(AnalysisError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(frames)
    }

    /// Parse a frame log, detecting the container format from the payload
    pub fn parse(input: &str) -> Result<Vec<RecordedFrame>, AnalysisError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Validate a batch of frames, returning only the failures
    pub fn validate_frames(frames: &[RecordedFrame]) -> Vec<FrameValidation> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(index, frame)| {
                frame
                    .validate()
                    .err()
                    .map(|error| FrameValidation { index, error })
            })
            .collect()
    }

    /// Convert recorded frames into a replayable observation sequence.
    ///
    /// Frames declaring a foreign schema are rejected; landmark-level noise
    /// is repaired per frame. Observations come back sorted by timestamp so
    /// recordings with shuffled lines still replay in order.
    pub fn to_observations(frames: &[RecordedFrame]) -> Result<Vec<Observation>, AnalysisError> {
        for (index, frame) in frames.iter().enumerate() {
            if let Some(schema) = &frame.schema {
                if schema != FRAME_SCHEMA_VERSION {
                    return Err(AnalysisError::ParseError(format!(
                        "Frame {} uses unsupported schema {}",
                        index, schema
                    )));
                }
            }
        }

        let mut observations: Vec<Observation> =
            frames.iter().map(RecordedFrame::to_observation).collect();
        observations.sort_by_key(|obs| obs.timestamp);
        Ok(observations)
    }
}

/// One failed frame from a validation pass
#[derive(Debug)]
pub struct FrameValidation {
    /// Zero-based index of the frame in the log
    pub index: usize,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    const NDJSON_LOG: &str = r#"{"schema":"motion.frame.v1","timestamp":200,"landmarks":[{"name":"thumb_tip","x":0.0,"y":0.0,"confidence":0.9},{"name":"index_finger_tip","x":42.0,"y":0.0,"confidence":0.9}]}
{"schema":"motion.frame.v1","timestamp":100,"landmarks":[{"name":"thumb_tip","x":0.0,"y":0.0,"confidence":0.9},{"name":"index_finger_tip","x":45.0,"y":0.0,"score":0.88}]}
{"schema":"motion.frame.v1","timestamp":300,"landmarks":[{"name":"thumb_tip","x":0.0,"y":0.0,"confidence":0.9},{"name":"index_finger_tip","x":25.0,"y":0.0,"confidence":0.9}]}"#;

    #[test]
    fn test_parse_ndjson() {
        let frames = FrameLogAdapter::parse_ndjson(NDJSON_LOG).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].timestamp.timestamp_millis(), 200);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let broken = "{\"schema\":\"motion.frame.v1\",\"timestamp\":100,\"landmarks\":[]}\nnot json";

        let err = FrameLogAdapter::parse_ndjson(broken).unwrap_err();

        match err {
            AnalysisError::ParseError(detail) => assert!(detail.contains("line 2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"timestamp": 100, "landmarks": [{"name": "nose", "x": 100.0, "y": 50.0, "confidence": 0.9}]},
            {"timestamp": 200, "landmarks": [{"name": "nose", "x": 101.0, "y": 50.0, "confidence": 0.9}]}
        ]"#;

        let frames = FrameLogAdapter::parse_array(json).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_parse_detects_container_format() {
        assert_eq!(FrameLogAdapter::parse(NDJSON_LOG).unwrap().len(), 3);

        let array = r#"[{"timestamp": 100, "landmarks": [{"name": "nose", "x": 1.0, "y": 2.0, "confidence": 0.5}]}]"#;
        assert_eq!(FrameLogAdapter::parse(array).unwrap().len(), 1);
    }

    #[test]
    fn test_validate_frames_reports_failures_with_index() {
        let mut frames = FrameLogAdapter::parse_ndjson(NDJSON_LOG).unwrap();
        frames[1].landmarks.clear();

        let failures = FrameLogAdapter::validate_frames(&frames);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert!(matches!(failures[0].error, ValidationError::EmptyLandmarks));
    }

    #[test]
    fn test_to_observations_sorts_by_timestamp() {
        let frames = FrameLogAdapter::parse_ndjson(NDJSON_LOG).unwrap();

        let observations = FrameLogAdapter::to_observations(&frames).unwrap();

        let millis: Vec<i64> = observations
            .iter()
            .map(|o| o.timestamp.timestamp_millis())
            .collect();
        assert_eq!(millis, vec![100, 200, 300]);
    }

    #[test]
    fn test_to_observations_rejects_foreign_schema() {
        let mut frames = FrameLogAdapter::parse_ndjson(NDJSON_LOG).unwrap();
        frames[2].schema = Some("motion.frame.v9".to_string());

        let err = FrameLogAdapter::to_observations(&frames).unwrap_err();

        match err {
            AnalysisError::ParseError(detail) => {
                assert!(detail.contains("Frame 2"));
                assert!(detail.contains("motion.frame.v9"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
