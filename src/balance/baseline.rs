//! Balance baseline capture and comparison
//!
//! A baseline freezes one windowed aggregate at calibration time. Later
//! aggregates are compared against it per metric family as signed percent
//! changes with positive meaning improvement.

use crate::balance::types::{BalanceAggregate, BalanceComparison};
use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A frozen balance aggregate used as the comparison reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceBaseline {
    /// When the baseline was captured (UTC)
    pub captured_at: DateTime<Utc>,
    /// Aggregation window the snapshot was computed over (seconds)
    pub window_secs: f64,
    pub aggregate: BalanceAggregate,
}

impl BalanceBaseline {
    /// Freeze an aggregate as the new baseline
    pub fn capture(aggregate: BalanceAggregate, window_secs: f64) -> Self {
        Self {
            captured_at: Utc::now(),
            window_secs,
            aggregate,
        }
    }

    /// Serialize for persistence by the embedder
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a previously persisted baseline
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Compare a current aggregate against the baseline.
///
/// Returns `None` when no baseline is set; comparison is optional, not
/// required.
pub fn compare(
    current: &BalanceAggregate,
    baseline: Option<&BalanceBaseline>,
) -> Option<BalanceComparison> {
    let baseline = baseline?;
    let base = &baseline.aggregate;

    let current_sway = current.sway.mean_lateral + current.sway.mean_anterior;
    let baseline_sway = base.sway.mean_lateral + base.sway.mean_anterior;

    Some(BalanceComparison {
        balance_change: relative_change(
            current.stability.mean_overall_balance,
            base.stability.mean_overall_balance,
        ),
        stability_change: relative_change(
            current.stability.mean_stability,
            base.stability.mean_stability,
        ),
        // Less sway than baseline is an improvement, so the sign flips
        sway_change: -relative_change(current_sway, baseline_sway),
        symmetry_change: -relative_change(current.weight.mean_imbalance, base.weight.mean_imbalance),
        baseline_captured_at: baseline.captured_at,
    })
}

/// Percent change relative to a baseline value; zero when the baseline is
/// zero or non-finite
fn relative_change(current: f64, baseline: f64) -> f64 {
    if !baseline.is_finite() || baseline.abs() < f64::EPSILON {
        return 0.0;
    }
    ((current - baseline) / baseline) * 100.0
}
