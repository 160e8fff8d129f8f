//! Windowed reduction of balance history

use crate::balance::types::{
    BalanceAggregate, BalanceMetrics, StabilityAggregate, SwayAggregate, WeightAggregate,
};
use crate::history::HistoryEntry;
use crate::stats::{linear_slope, mean, sample_std};

/// Reduces a chronological window of balance records into summary statistics
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Aggregate a window of history entries.
    ///
    /// An empty window yields the neutral aggregate; this never fails.
    pub fn aggregate(entries: &[HistoryEntry<BalanceMetrics>]) -> BalanceAggregate {
        if entries.is_empty() {
            return BalanceAggregate::neutral();
        }

        let lateral: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.postural_sway.lateral)
            .collect();
        let anterior: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.postural_sway.anterior)
            .collect();
        let stability: Vec<f64> = entries.iter().map(|e| e.metrics.stability_score).collect();
        let overall: Vec<f64> = entries.iter().map(|e| e.metrics.overall_balance).collect();
        let left: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.weight_distribution.left)
            .collect();
        let right: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.weight_distribution.right)
            .collect();
        let imbalance: Vec<f64> = entries
            .iter()
            .map(|e| (e.metrics.weight_distribution.left - e.metrics.weight_distribution.right).abs())
            .collect();

        let first_ts = entries[0].timestamp;
        let elapsed_secs: Vec<f64> = entries
            .iter()
            .map(|e| (e.timestamp - first_ts).num_milliseconds() as f64 / 1000.0)
            .collect();
        let window_secs = elapsed_secs.last().copied().unwrap_or(0.0);

        BalanceAggregate {
            sway: SwayAggregate {
                mean_lateral: mean(&lateral),
                mean_anterior: mean(&anterior),
                lateral_variability: sample_std(&lateral),
                anterior_variability: sample_std(&anterior),
            },
            stability: StabilityAggregate {
                mean_stability: mean(&stability),
                mean_overall_balance: mean(&overall),
                stability_slope: linear_slope(&elapsed_secs, &stability),
            },
            weight: WeightAggregate {
                mean_left: mean(&left),
                mean_right: mean(&right),
                mean_imbalance: mean(&imbalance),
            },
            sample_count: entries.len(),
            window_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::types::{PosturalSway, WeightDistribution};
    use chrono::{TimeZone, Utc};

    fn make_entry(ts_ms: i64, lateral: f64, stability: f64, left: f64) -> HistoryEntry<BalanceMetrics> {
        HistoryEntry::new(
            Utc.timestamp_millis_opt(ts_ms).single().unwrap(),
            BalanceMetrics {
                overall_balance: 75.0,
                postural_sway: PosturalSway {
                    lateral,
                    anterior: lateral / 2.0,
                },
                weight_distribution: WeightDistribution {
                    left,
                    right: 100.0 - left,
                },
                stability_score: stability,
            },
        )
    }

    #[test]
    fn test_empty_window_yields_neutral_aggregate() {
        let aggregate = BalanceAggregator::aggregate(&[]);

        assert_eq!(aggregate.sample_count, 0);
        assert!((aggregate.stability.mean_stability - 0.0).abs() < 1e-9);
        assert!((aggregate.weight.mean_left - 50.0).abs() < 1e-9);
        assert!((aggregate.window_secs - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_means_over_window() {
        let entries = vec![
            make_entry(0, 2.0, 90.0, 60.0),
            make_entry(1_000, 4.0, 80.0, 40.0),
            make_entry(2_000, 6.0, 70.0, 50.0),
        ];

        let aggregate = BalanceAggregator::aggregate(&entries);

        assert_eq!(aggregate.sample_count, 3);
        assert!((aggregate.sway.mean_lateral - 4.0).abs() < 1e-9);
        assert!((aggregate.sway.mean_anterior - 2.0).abs() < 1e-9);
        assert!((aggregate.stability.mean_stability - 80.0).abs() < 1e-9);
        assert!((aggregate.weight.mean_left - 50.0).abs() < 1e-9);
        // |60-40|, |40-60|, |50-50| -> mean 40/3
        assert!((aggregate.weight.mean_imbalance - 40.0 / 3.0).abs() < 1e-9);
        assert!((aggregate.window_secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sway_variability_is_sample_std() {
        let entries = vec![
            make_entry(0, 2.0, 90.0, 50.0),
            make_entry(1_000, 4.0, 90.0, 50.0),
            make_entry(2_000, 6.0, 90.0, 50.0),
        ];

        let aggregate = BalanceAggregator::aggregate(&entries);

        // Sample std of [2, 4, 6] = 2
        assert!((aggregate.sway.lateral_variability - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability_slope_tracks_decline() {
        let entries = vec![
            make_entry(0, 2.0, 90.0, 50.0),
            make_entry(1_000, 2.0, 85.0, 50.0),
            make_entry(2_000, 2.0, 80.0, 50.0),
        ];

        let aggregate = BalanceAggregator::aggregate(&entries);

        // Stability drops 5 points per second
        assert!((aggregate.stability.stability_slope + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_entry_window() {
        let entries = vec![make_entry(0, 3.0, 88.0, 55.0)];

        let aggregate = BalanceAggregator::aggregate(&entries);

        assert_eq!(aggregate.sample_count, 1);
        assert!((aggregate.sway.mean_lateral - 3.0).abs() < 1e-9);
        assert!((aggregate.sway.lateral_variability - 0.0).abs() < 1e-9);
        assert!((aggregate.stability.stability_slope - 0.0).abs() < 1e-9);
    }
}
