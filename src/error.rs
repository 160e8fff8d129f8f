//! Error types for Kinemetry

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse frame log: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Frame source failure: {0}")]
    DetectorFailure(String),

    #[error("Session is already running")]
    SessionAlreadyRunning,

    #[error("Insufficient history for computation: {0}")]
    InsufficientHistory(String),
}
