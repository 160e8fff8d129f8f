//! motion.frame.v1 frame-log schema
//!
//! This module defines the detector-agnostic ingestion schema for recorded
//! landmark frames. It supports both NDJSON streams (one frame per line)
//! and JSON array exports.

mod adapter;
mod frame_log;

pub use adapter::*;
pub use frame_log::*;
