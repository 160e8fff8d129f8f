//! Standing-balance assessment pipeline
//!
//! Derives sway, weight distribution, and stability from pose observations,
//! reduces recent history into windowed aggregates, and compares aggregates
//! against a calibration baseline.

pub mod aggregator;
pub mod baseline;
pub mod extractor;
pub mod pipeline;
pub mod types;

pub use aggregator::BalanceAggregator;
pub use baseline::{compare, BalanceBaseline};
pub use extractor::BalanceExtractor;
pub use pipeline::{analyze_recording, BalanceRecordingAnalysis, BalanceSession};
pub use types::{BalanceAggregate, BalanceComparison, BalanceConfig, BalanceMetrics};
