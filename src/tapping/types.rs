//! Types for the finger-tapping pipeline

use crate::types::Point3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default minimum landmark confidence before a fingertip counts as present
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Default fingertip aperture below which the fingers count as in contact
pub const DEFAULT_CONTACT_THRESHOLD: f64 = 30.0;

/// Default target inter-tap interval (milliseconds)
pub const DEFAULT_TARGET_INTERVAL_MS: f64 = 200.0;

/// Default temporal-precision penalty per millisecond of interval deviation
pub const DEFAULT_TEMPORAL_PENALTY: f64 = 0.5;

/// Default decay scale for spatial precision (trajectory deviation units)
pub const DEFAULT_SPATIAL_SCALE: f64 = 10.0;

/// Default closing speed mapped to full tap force (units per second)
pub const DEFAULT_FORCE_SCALE: f64 = 300.0;

/// Default decay scale for smoothness (jerk magnitude units)
pub const DEFAULT_JERK_SCALE: f64 = 5_000.0;

/// Default amplitude decline rate that flags fatigue (units per second)
pub const DEFAULT_FATIGUE_AMPLITUDE_THRESHOLD: f64 = 1.0;

/// Default frequency decline that flags fatigue (taps per second)
pub const DEFAULT_FATIGUE_FREQUENCY_THRESHOLD: f64 = 0.2;

/// Default precision share of the composite quality score
pub const DEFAULT_PRECISION_WEIGHT: f64 = 0.5;

/// Default smoothness share of the composite quality score
pub const DEFAULT_SMOOTHNESS_WEIGHT: f64 = 0.5;

/// Calibration constants for the tapping formulas.
///
/// The tap sub-metrics have no closed-form physical definition; these scales
/// exist to be tuned against recorded reference sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Landmarks below this confidence count as missing
    pub min_confidence: f64,
    /// Fingertip aperture below this counts as finger contact
    pub contact_threshold: f64,
    /// Target inter-tap interval for temporal precision (milliseconds)
    pub target_interval_ms: f64,
    /// Temporal precision lost per millisecond of interval deviation
    pub temporal_penalty: f64,
    /// Trajectory deviation at which spatial precision decays by 1/e
    pub spatial_scale: f64,
    /// Closing speed mapped to a tap force of 1.0 (units per second)
    pub force_scale: f64,
    /// Jerk magnitude at which smoothness decays by 1/e
    pub jerk_scale: f64,
    /// Amplitude decline rate that flags fatigue (units per second)
    pub fatigue_amplitude_threshold: f64,
    /// Late-vs-early frequency drop that flags fatigue (taps per second)
    pub fatigue_frequency_threshold: f64,
    /// Precision share of the composite quality score
    pub precision_weight: f64,
    /// Smoothness share of the composite quality score
    pub smoothness_weight: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            contact_threshold: DEFAULT_CONTACT_THRESHOLD,
            target_interval_ms: DEFAULT_TARGET_INTERVAL_MS,
            temporal_penalty: DEFAULT_TEMPORAL_PENALTY,
            spatial_scale: DEFAULT_SPATIAL_SCALE,
            force_scale: DEFAULT_FORCE_SCALE,
            jerk_scale: DEFAULT_JERK_SCALE,
            fatigue_amplitude_threshold: DEFAULT_FATIGUE_AMPLITUDE_THRESHOLD,
            fatigue_frequency_threshold: DEFAULT_FATIGUE_FREQUENCY_THRESHOLD,
            precision_weight: DEFAULT_PRECISION_WEIGHT,
            smoothness_weight: DEFAULT_SMOOTHNESS_WEIGHT,
        }
    }
}

/// Kinematics of the thumb/index aperture for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapCharacteristics {
    /// Signed aperture rate (units per second; negative while closing)
    pub velocity: f64,
    /// Thumb-tip to index-tip aperture (frame-source units)
    pub amplitude: f64,
    /// Aperture rate change (units per second squared)
    pub acceleration: f64,
    /// Recent index-fingertip positions, oldest first
    pub trajectory: Vec<Point3>,
}

/// Spatial and temporal accuracy of the tapping movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementPrecision {
    /// Straightness of the recent fingertip path in [0, 100]
    pub spatial: f64,
    /// Closeness of the last inter-tap interval to the target in [0, 100]
    pub temporal: f64,
    /// Absolute gap between the last interval and the target (milliseconds)
    pub target_deviation: f64,
}

/// Instantaneous tapping metrics for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapMetrics {
    pub tap_characteristics: TapCharacteristics,
    pub movement_precision: MovementPrecision,
    /// Contact-force estimate in [0, 1]; zero outside finger contact
    pub tap_force: f64,
    /// Jerk-based movement smoothness in [0, 100]
    pub smoothness: f64,
}

impl TapMetrics {
    /// Record produced when required landmarks are missing or unreliable
    pub fn neutral() -> Self {
        Self {
            tap_characteristics: TapCharacteristics {
                velocity: 0.0,
                amplitude: 0.0,
                acceleration: 0.0,
                trajectory: Vec::new(),
            },
            movement_precision: MovementPrecision {
                spatial: 0.0,
                temporal: 0.0,
                target_deviation: 0.0,
            },
            tap_force: 0.0,
            smoothness: 0.0,
        }
    }
}

/// Windowed tap-rate statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapFrequencyMetrics {
    /// Contact onsets detected in the window
    pub tap_count: usize,
    pub taps_per_second: f64,
}

/// Windowed inter-tap interval statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapRhythmMetrics {
    pub mean_interval_ms: f64,
    /// Coefficient of variation of the inter-tap intervals
    pub interval_cv: f64,
    /// Interval regularity in [0, 100]; 100 when too few taps to judge
    pub regularity: f64,
}

/// Windowed decline indicators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapFatigueMetrics {
    pub mean_amplitude: f64,
    /// Least-squares amplitude trend (units per second)
    pub amplitude_slope: f64,
    /// Late-half minus early-half tap rate (taps per second)
    pub frequency_slope: f64,
    /// Whether either trend crosses its fatigue threshold
    pub declining: bool,
}

/// Windowed precision and smoothness statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapQualityMetrics {
    pub mean_spatial_precision: f64,
    pub mean_temporal_precision: f64,
    /// Mean of the spatial and temporal means
    pub mean_precision: f64,
    pub mean_smoothness: f64,
    /// Weighted blend of precision and smoothness in [0, 100]
    pub composite: f64,
}

/// Windowed reduction of tapping history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapAggregate {
    pub frequency: TapFrequencyMetrics,
    pub rhythm: TapRhythmMetrics,
    pub fatigue: TapFatigueMetrics,
    pub quality: TapQualityMetrics,
    /// Entries reduced into this aggregate
    pub sample_count: usize,
    /// Observed span of the reduced entries (seconds)
    pub window_secs: f64,
}

impl TapAggregate {
    /// Aggregate for an empty window
    pub fn neutral() -> Self {
        Self {
            frequency: TapFrequencyMetrics {
                tap_count: 0,
                taps_per_second: 0.0,
            },
            rhythm: TapRhythmMetrics {
                mean_interval_ms: 0.0,
                interval_cv: 0.0,
                regularity: 0.0,
            },
            fatigue: TapFatigueMetrics {
                mean_amplitude: 0.0,
                amplitude_slope: 0.0,
                frequency_slope: 0.0,
                declining: false,
            },
            quality: TapQualityMetrics {
                mean_spatial_precision: 0.0,
                mean_temporal_precision: 0.0,
                mean_precision: 0.0,
                mean_smoothness: 0.0,
                composite: 0.0,
            },
            sample_count: 0,
            window_secs: 0.0,
        }
    }
}

/// Relative change of a tapping aggregate against a baseline.
///
/// Every field is signed with positive meaning improvement: a faster tap
/// rate, more regular rhythm, a flatter amplitude decline, higher quality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapComparison {
    /// Percent change of taps per second
    pub frequency_change: f64,
    /// Percent change of rhythm regularity
    pub rhythm_change: f64,
    /// Amplitude-slope difference against the baseline (units per second)
    pub fatigue_comparison: f64,
    /// Percent change of the composite quality score
    pub quality_comparison: f64,
    /// When the baseline was captured
    pub baseline_captured_at: DateTime<Utc>,
}
