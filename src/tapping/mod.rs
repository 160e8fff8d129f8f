//! Finger-tapping assessment pipeline
//!
//! Derives tap kinematics from hand observations: fingertip aperture,
//! velocity, acceleration, trajectory, precision, force, and smoothness per
//! frame, then windowed frequency, rhythm, fatigue, and quality aggregates
//! comparable against a calibration baseline.

pub mod aggregator;
pub mod baseline;
pub mod extractor;
pub mod pipeline;
pub mod types;

pub use aggregator::TapAggregator;
pub use baseline::{compare, TapBaseline};
pub use extractor::TapExtractor;
pub use pipeline::{analyze_recording, TapRecordingAnalysis, TapSession};
pub use types::{TapAggregate, TapComparison, TapConfig, TapMetrics};
