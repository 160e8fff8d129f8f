//! Kinemetry - Real-time motion analysis core for camera-based health assessments
//!
//! Kinemetry turns detector landmark streams into assessment metrics through a
//! deterministic pipeline: frame ingestion → metric extraction → history
//! buffering → windowed aggregation → baseline comparison → report encoding.
//!
//! ## Modules
//!
//! - **Balance Pipeline**: Derive sway, weight distribution, and stability from pose observations
//! - **Tapping Pipeline**: Derive tap kinematics, rhythm, fatigue, and quality from hand observations
//!
//! Rendering, persistence, and transport stay with the embedding application;
//! everything here is plain structured data.

pub mod balance;
pub mod error;
pub mod history;
pub mod report;
pub mod schema;
pub mod session;
pub mod tapping;
pub mod types;

mod stats;

pub use error::AnalysisError;
pub use history::{HistoryBuffer, HistoryEntry};
pub use report::{AssessmentReport, ReportEncoder, REPORT_SCHEMA_VERSION};
pub use session::{
    AssessmentSession, FrameSource, MetricExtractor, ReplayFrameSource, SessionHandle,
    SessionState, SessionSummary,
};

// Schema exports
pub use schema::{FrameLogAdapter, RecordedFrame, FRAME_SCHEMA_VERSION};

// Pipeline exports
pub use balance::{BalanceConfig, BalanceMetrics, BalanceSession};
pub use tapping::{TapConfig, TapMetrics, TapSession};

/// Default aggregation window over recent history (milliseconds)
pub const DEFAULT_AGGREGATION_WINDOW_MS: i64 = 5_000;

/// Kinemetry version embedded in all report payloads
pub const KINEMETRY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "kinemetry";
