//! Tapping baseline capture and comparison
//!
//! A baseline freezes one windowed aggregate at calibration time. Later
//! aggregates are compared against it per metric family with positive
//! meaning improvement.

use crate::error::AnalysisError;
use crate::tapping::types::{TapAggregate, TapComparison};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A frozen tapping aggregate used as the comparison reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapBaseline {
    /// When the baseline was captured (UTC)
    pub captured_at: DateTime<Utc>,
    /// Aggregation window the snapshot was computed over (seconds)
    pub window_secs: f64,
    pub aggregate: TapAggregate,
}

impl TapBaseline {
    /// Freeze an aggregate as the new baseline
    pub fn capture(aggregate: TapAggregate, window_secs: f64) -> Self {
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
pub fn compare(current: &TapAggregate, baseline: Option<&TapBaseline>) -> Option<TapComparison> {
    let baseline = baseline?;
    let base = &baseline.aggregate;

    Some(TapComparison {
        frequency_change: relative_change(
            current.frequency.taps_per_second,
            base.frequency.taps_per_second,
        ),
        rhythm_change: relative_change(current.rhythm.regularity, base.rhythm.regularity),
        // A flatter amplitude decline than baseline is an improvement, so
        // the slope difference carries the sign directly
        fatigue_comparison: current.fatigue.amplitude_slope - base.fatigue.amplitude_slope,
        quality_comparison: relative_change(current.quality.composite, base.quality.composite),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tapping::types::{
        TapFatigueMetrics, TapFrequencyMetrics, TapQualityMetrics, TapRhythmMetrics,
    };

    fn make_aggregate(taps_per_second: f64, regularity: f64, slope: f64, composite: f64) -> TapAggregate {
        TapAggregate {
            frequency: TapFrequencyMetrics {
                tap_count: (taps_per_second * 5.0) as usize,
                taps_per_second,
            },
            rhythm: TapRhythmMetrics {
                mean_interval_ms: 250.0,
                interval_cv: 1.0 - regularity / 100.0,
                regularity,
            },
            fatigue: TapFatigueMetrics {
                mean_amplitude: 40.0,
                amplitude_slope: slope,
                frequency_slope: 0.0,
                declining: slope < -1.0,
            },
            quality: TapQualityMetrics {
                mean_spatial_precision: composite,
                mean_temporal_precision: composite,
                mean_precision: composite,
                mean_smoothness: composite,
                composite,
            },
            sample_count: 150,
            window_secs: 5.0,
        }
    }

    #[test]
    fn test_compare_without_baseline_is_none() {
        let current = make_aggregate(4.0, 90.0, -0.5, 80.0);
        assert!(compare(&current, None).is_none());
    }

    #[test]
    fn test_improvement_signs() {
        let baseline = TapBaseline::capture(make_aggregate(4.0, 80.0, -2.0, 60.0), 5.0);
        // Faster, more regular, flatter decline, higher quality
        let current = make_aggregate(5.0, 88.0, -0.5, 75.0);

        let comparison = compare(&current, Some(&baseline)).unwrap();

        assert!((comparison.frequency_change - 25.0).abs() < 1e-9);
        assert!((comparison.rhythm_change - 10.0).abs() < 1e-9);
        assert!((comparison.fatigue_comparison - 1.5).abs() < 1e-9);
        assert!((comparison.quality_comparison - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_decline_signs() {
        let baseline = TapBaseline::capture(make_aggregate(5.0, 92.0, -0.2, 85.0), 5.0);
        let current = make_aggregate(4.0, 69.0, -1.2, 68.0);

        let comparison = compare(&current, Some(&baseline)).unwrap();

        assert!(comparison.frequency_change < 0.0);
        assert!(comparison.rhythm_change < 0.0);
        assert!(comparison.fatigue_comparison < 0.0);
        assert!(comparison.quality_comparison < 0.0);
    }

    #[test]
    fn test_zero_baseline_values_compare_as_zero_change() {
        let baseline = TapBaseline::capture(make_aggregate(0.0, 0.0, 0.0, 0.0), 5.0);
        let current = make_aggregate(4.0, 90.0, -0.5, 80.0);

        let comparison = compare(&current, Some(&baseline)).unwrap();

        assert!((comparison.frequency_change - 0.0).abs() < 1e-9);
        assert!((comparison.quality_comparison - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_json_round_trip() {
        let baseline = TapBaseline::capture(make_aggregate(4.5, 86.0, -0.8, 74.0), 5.0);
        let current = make_aggregate(4.8, 90.0, -0.4, 79.0);

        let restored = TapBaseline::from_json(&baseline.to_json().unwrap()).unwrap();

        let direct = compare(&current, Some(&baseline)).unwrap();
        let roundtrip = compare(&current, Some(&restored)).unwrap();
        assert!((direct.frequency_change - roundtrip.frequency_change).abs() < 1e-9);
        assert!((direct.fatigue_comparison - roundtrip.fatigue_comparison).abs() < 1e-9);
        assert_eq!(direct.baseline_captured_at, roundtrip.baseline_captured_at);
    }
}
