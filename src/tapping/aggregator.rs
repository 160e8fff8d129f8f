//! Windowed reduction of tapping history
//!
//! Detects contact onsets from the aperture series, then reduces the window
//! into frequency, rhythm, fatigue, and quality statistics.

use crate::history::HistoryEntry;
use crate::stats::{linear_slope, mean, sample_std};
use crate::tapping::types::{
    TapAggregate, TapConfig, TapFatigueMetrics, TapFrequencyMetrics, TapMetrics,
    TapQualityMetrics, TapRhythmMetrics,
};

/// Reduces a chronological window of tapping records into summary statistics
#[derive(Debug, Clone, Default)]
pub struct TapAggregator {
    config: TapConfig,
}

impl TapAggregator {
    pub fn new(config: TapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Aggregate a window of history entries.
    ///
    /// An empty window yields the neutral aggregate; this never fails.
    pub fn aggregate(&self, entries: &[HistoryEntry<TapMetrics>]) -> TapAggregate {
        if entries.is_empty() {
            return TapAggregate::neutral();
        }

        let first_ts = entries[0].timestamp;
        let elapsed_secs: Vec<f64> = entries
            .iter()
            .map(|e| (e.timestamp - first_ts).num_milliseconds() as f64 / 1000.0)
            .collect();
        let window_secs = elapsed_secs.last().copied().unwrap_or(0.0);

        let amplitudes: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.tap_characteristics.amplitude)
            .collect();

        let onsets = detect_onsets(&amplitudes, self.config.contact_threshold);
        let onset_times: Vec<f64> = onsets.iter().map(|&i| elapsed_secs[i]).collect();

        let frequency = TapFrequencyMetrics {
            tap_count: onsets.len(),
            taps_per_second: if window_secs > 0.0 {
                onsets.len() as f64 / window_secs
            } else {
                0.0
            },
        };

        let intervals_ms: Vec<f64> = onset_times
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) * 1000.0)
            .collect();
        let rhythm = reduce_rhythm(&intervals_ms);

        let amplitude_slope = linear_slope(&elapsed_secs, &amplitudes);
        let frequency_slope = frequency_slope(&onset_times, window_secs);
        let fatigue = TapFatigueMetrics {
            mean_amplitude: mean_cycle_amplitude(&amplitudes, &onsets),
            amplitude_slope,
            frequency_slope,
            declining: amplitude_slope < -self.config.fatigue_amplitude_threshold
                || frequency_slope < -self.config.fatigue_frequency_threshold,
        };

        let quality = self.reduce_quality(entries);

        TapAggregate {
            frequency,
            rhythm,
            fatigue,
            quality,
            sample_count: entries.len(),
            window_secs,
        }
    }

    fn reduce_quality(&self, entries: &[HistoryEntry<TapMetrics>]) -> TapQualityMetrics {
        let spatial: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.movement_precision.spatial)
            .collect();
        let temporal: Vec<f64> = entries
            .iter()
            .map(|e| e.metrics.movement_precision.temporal)
            .collect();
        let smoothness: Vec<f64> = entries.iter().map(|e| e.metrics.smoothness).collect();

        let mean_spatial_precision = mean(&spatial);
        let mean_temporal_precision = mean(&temporal);
        let mean_precision = (mean_spatial_precision + mean_temporal_precision) / 2.0;
        let mean_smoothness = mean(&smoothness);
        let composite = (mean_precision * self.config.precision_weight
            + mean_smoothness * self.config.smoothness_weight)
            .clamp(0.0, 100.0);

        TapQualityMetrics {
            mean_spatial_precision,
            mean_temporal_precision,
            mean_precision,
            mean_smoothness,
            composite,
        }
    }
}

/// Indexes where the aperture crosses below the contact threshold
fn detect_onsets(amplitudes: &[f64], threshold: f64) -> Vec<usize> {
    amplitudes
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1] < threshold && pair[0] >= threshold)
        .map(|(i, _)| i + 1)
        .collect()
}

fn reduce_rhythm(intervals_ms: &[f64]) -> TapRhythmMetrics {
    // Below two intervals there is nothing to judge regularity against
    if intervals_ms.len() < 2 {
        return TapRhythmMetrics {
            mean_interval_ms: intervals_ms.first().copied().unwrap_or(0.0),
            interval_cv: 0.0,
            regularity: 100.0,
        };
    }

    let mean_interval_ms = mean(intervals_ms);
    let interval_cv = if mean_interval_ms.abs() < f64::EPSILON {
        0.0
    } else {
        sample_std(intervals_ms) / mean_interval_ms
    };
    let regularity = (100.0 * (1.0 - interval_cv)).clamp(0.0, 100.0);

    TapRhythmMetrics {
        mean_interval_ms,
        interval_cv,
        regularity,
    }
}

/// Mean of per-cycle peak apertures; plain amplitude mean when the window
/// holds no onsets
fn mean_cycle_amplitude(amplitudes: &[f64], onsets: &[usize]) -> f64 {
    if onsets.is_empty() {
        return mean(amplitudes);
    }

    let mut boundaries = Vec::with_capacity(onsets.len() + 2);
    boundaries.push(0);
    boundaries.extend_from_slice(onsets);
    boundaries.push(amplitudes.len());

    let peaks: Vec<f64> = boundaries
        .windows(2)
        .filter(|pair| pair[1] > pair[0])
        .map(|pair| {
            amplitudes[pair[0]..pair[1]]
                .iter()
                .fold(f64::MIN, |acc, &v| acc.max(v))
        })
        .collect();

    mean(&peaks)
}

/// Late-half minus early-half tap rate across the window
fn frequency_slope(onset_times: &[f64], window_secs: f64) -> f64 {
    let half_span = window_secs / 2.0;
    if half_span <= 0.0 {
        return 0.0;
    }

    let early = onset_times.iter().filter(|&&t| t < half_span).count() as f64;
    let late = onset_times.len() as f64 - early;
    (late - early) / half_span
}
