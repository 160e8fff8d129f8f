//! Types for the balance pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default minimum landmark confidence before a landmark counts as present
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Default penalty per unit of hip/shoulder horizontal offset (stability)
pub const DEFAULT_ALIGNMENT_WEIGHT: f64 = 5.0;

/// Default penalty per unit of lateral sway (stability)
pub const DEFAULT_STABILITY_SWAY_WEIGHT: f64 = 2.0;

/// Default penalty per unit of total sway (overall balance)
pub const DEFAULT_SWAY_PENALTY_WEIGHT: f64 = 2.0;

/// Default divisor for the left/right weight gap (overall balance)
pub const DEFAULT_IMBALANCE_DIVISOR: f64 = 2.0;

/// Calibration constants for the balance formulas.
///
/// The weighting constants are design choices rather than physical constants;
/// they live here so deployments can tune them against reference recordings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Landmarks below this confidence count as missing
    pub min_confidence: f64,
    /// Stability penalty per unit of hip/shoulder horizontal offset
    pub alignment_weight: f64,
    /// Stability penalty per unit of lateral sway
    pub stability_sway_weight: f64,
    /// Overall-balance penalty per unit of combined sway
    pub sway_penalty_weight: f64,
    /// Divisor applied to the left/right weight gap in the overall score
    pub imbalance_divisor: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            alignment_weight: DEFAULT_ALIGNMENT_WEIGHT,
            stability_sway_weight: DEFAULT_STABILITY_SWAY_WEIGHT,
            sway_penalty_weight: DEFAULT_SWAY_PENALTY_WEIGHT,
            imbalance_divisor: DEFAULT_IMBALANCE_DIVISOR,
        }
    }
}

/// Nose drift from the body's reference lines (frame-source units)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PosturalSway {
    /// Horizontal drift from the ankle midline
    pub lateral: f64,
    /// Vertical drift from shoulder height
    pub anterior: f64,
}

/// Estimated left/right load split (percent, sums to 100)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightDistribution {
    pub left: f64,
    pub right: f64,
}

/// Instantaneous balance metrics for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceMetrics {
    /// Composite balance score in [0, 100]
    pub overall_balance: f64,
    pub postural_sway: PosturalSway,
    pub weight_distribution: WeightDistribution,
    /// Postural stability score in [0, 100]
    pub stability_score: f64,
}

impl BalanceMetrics {
    /// Record produced when required landmarks are missing or unreliable:
    /// zero scores and sway with an even weight split.
    pub fn neutral() -> Self {
        Self {
            overall_balance: 0.0,
            postural_sway: PosturalSway {
                lateral: 0.0,
                anterior: 0.0,
            },
            weight_distribution: WeightDistribution {
                left: 50.0,
                right: 50.0,
            },
            stability_score: 0.0,
        }
    }
}

/// Windowed sway statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwayAggregate {
    pub mean_lateral: f64,
    pub mean_anterior: f64,
    /// Sample standard deviation of lateral sway
    pub lateral_variability: f64,
    /// Sample standard deviation of anterior sway
    pub anterior_variability: f64,
}

/// Windowed stability statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityAggregate {
    pub mean_stability: f64,
    pub mean_overall_balance: f64,
    /// Least-squares trend of the stability score (points per second)
    pub stability_slope: f64,
}

/// Windowed weight-distribution statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightAggregate {
    pub mean_left: f64,
    pub mean_right: f64,
    /// Mean absolute left/right gap (percent points)
    pub mean_imbalance: f64,
}

/// Windowed reduction of balance history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceAggregate {
    pub sway: SwayAggregate,
    pub stability: StabilityAggregate,
    pub weight: WeightAggregate,
    /// Entries reduced into this aggregate
    pub sample_count: usize,
    /// Observed span of the reduced entries (seconds)
    pub window_secs: f64,
}

impl BalanceAggregate {
    /// Aggregate for an empty window
    pub fn neutral() -> Self {
        Self {
            sway: SwayAggregate {
                mean_lateral: 0.0,
                mean_anterior: 0.0,
                lateral_variability: 0.0,
                anterior_variability: 0.0,
            },
            stability: StabilityAggregate {
                mean_stability: 0.0,
                mean_overall_balance: 0.0,
                stability_slope: 0.0,
            },
            weight: WeightAggregate {
                mean_left: 50.0,
                mean_right: 50.0,
                mean_imbalance: 0.0,
            },
            sample_count: 0,
            window_secs: 0.0,
        }
    }
}

/// Relative change of a balance aggregate against a baseline.
///
/// Every field is signed with positive meaning improvement: higher overall
/// balance, higher stability, less sway, smaller left/right imbalance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceComparison {
    /// Percent change of mean overall balance
    pub balance_change: f64,
    /// Percent change of mean stability
    pub stability_change: f64,
    /// Sign-flipped percent change of combined mean sway
    pub sway_change: f64,
    /// Sign-flipped percent change of mean imbalance
    pub symmetry_change: f64,
    /// When the baseline was captured
    pub baseline_captured_at: DateTime<Utc>,
}
