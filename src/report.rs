//! Assessment report encoding
//!
//! This module encodes a finished session run into a versioned
//! `assessment.report.v1` payload for display and export collaborators.
//! Reports carry producer provenance, the run's session statistics, the
//! windowed aggregate, the baseline comparison when one was set, and
//! normal-range findings. Rendering stays external.

use crate::balance::{BalanceAggregate, BalanceComparison};
use crate::error::AnalysisError;
use crate::session::SessionSummary;
use crate::tapping::{TapAggregate, TapComparison};
use crate::types::{RangeStatus, TAP_NORMAL_RANGES};
use crate::{KINEMETRY_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_SCHEMA_VERSION: &str = "assessment.report.v1";

/// Producer metadata stamped on every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One displayed metric classified against its reference range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeFinding {
    pub metric: String,
    pub value: f64,
    pub status: RangeStatus,
    pub low: f64,
    pub high: f64,
    pub unit: String,
}

/// Assessment-specific report section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "assessment", rename_all = "snake_case")]
pub enum ReportMetrics {
    Balance {
        aggregate: BalanceAggregate,
        #[serde(skip_serializing_if = "Option::is_none")]
        comparison: Option<BalanceComparison>,
    },
    FingerTap {
        aggregate: TapAggregate,
        #[serde(skip_serializing_if = "Option::is_none")]
        comparison: Option<TapComparison>,
        findings: Vec<RangeFinding>,
    },
}

/// Versioned report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub schema: String,
    pub producer: ReportProducer,
    /// When the report was encoded (UTC)
    pub generated_at: DateTime<Utc>,
    /// Statistics of the run the report covers
    pub session: SessionSummary,
    /// Headline score for the run in [0, 100]
    pub overall_score: f64,
    pub metrics: ReportMetrics,
}

impl AssessmentReport {
    /// Serialize to pretty JSON for export
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a previously exported report
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Report encoder for producing versioned payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a finished balance run.
    ///
    /// The overall score is the window's mean overall balance.
    pub fn encode_balance(
        &self,
        summary: &SessionSummary,
        aggregate: &BalanceAggregate,
        comparison: Option<BalanceComparison>,
    ) -> AssessmentReport {
        AssessmentReport {
            schema: REPORT_SCHEMA_VERSION.to_string(),
            producer: self.build_producer(),
            generated_at: Utc::now(),
            session: summary.clone(),
            overall_score: aggregate.stability.mean_overall_balance,
            metrics: ReportMetrics::Balance {
                aggregate: aggregate.clone(),
                comparison,
            },
        }
    }

    /// Encode a finished finger-tapping run.
    ///
    /// The overall score averages mean precision and rhythm regularity, and
    /// every tapping metric with a reference range gets a finding.
    pub fn encode_tapping(
        &self,
        summary: &SessionSummary,
        aggregate: &TapAggregate,
        comparison: Option<TapComparison>,
    ) -> AssessmentReport {
        AssessmentReport {
            schema: REPORT_SCHEMA_VERSION.to_string(),
            producer: self.build_producer(),
            generated_at: Utc::now(),
            session: summary.clone(),
            overall_score: tapping_overall_score(aggregate),
            metrics: ReportMetrics::FingerTap {
                aggregate: aggregate.clone(),
                comparison,
                findings: tapping_findings(aggregate),
            },
        }
    }

    fn build_producer(&self) -> ReportProducer {
        ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: KINEMETRY_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }
}

fn tapping_overall_score(aggregate: &TapAggregate) -> f64 {
    (aggregate.quality.mean_precision + aggregate.rhythm.regularity) / 2.0
}

fn tapping_findings(aggregate: &TapAggregate) -> Vec<RangeFinding> {
    TAP_NORMAL_RANGES
        .iter()
        .filter_map(|range| {
            let value = match range.metric {
                "tap_frequency" => aggregate.frequency.taps_per_second,
                "tap_amplitude" => aggregate.fatigue.mean_amplitude,
                "rhythm_regularity" => aggregate.rhythm.regularity,
                "movement_precision" => aggregate.quality.mean_precision,
                _ => return None,
            };
            Some(RangeFinding {
                metric: range.metric.to_string(),
                value,
                status: range.classify(value),
                low: range.low,
                high: range.high,
                unit: range.unit.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::types::{StabilityAggregate, SwayAggregate, WeightAggregate};
    use crate::tapping::types::{
        TapFatigueMetrics, TapFrequencyMetrics, TapQualityMetrics, TapRhythmMetrics,
    };
    use chrono::TimeZone;

    fn make_summary() -> SessionSummary {
        SessionSummary {
            frames_processed: 120,
            records_emitted: 119,
            source_errors: 0,
            out_of_order_dropped: 1,
            first_timestamp: Utc.timestamp_millis_opt(0).single(),
            last_timestamp: Utc.timestamp_millis_opt(3_960).single(),
            stopped_early: false,
            issues: vec![],
        }
    }

    fn make_balance_aggregate() -> BalanceAggregate {
        BalanceAggregate {
            sway: SwayAggregate {
                mean_lateral: 3.0,
                mean_anterior: 5.0,
                lateral_variability: 1.0,
                anterior_variability: 2.0,
            },
            stability: StabilityAggregate {
                mean_stability: 90.0,
                mean_overall_balance: 88.0,
                stability_slope: -0.1,
            },
            weight: WeightAggregate {
                mean_left: 52.0,
                mean_right: 48.0,
                mean_imbalance: 4.0,
            },
            sample_count: 119,
            window_secs: 3.96,
        }
    }

    fn make_tap_aggregate() -> TapAggregate {
        TapAggregate {
            frequency: TapFrequencyMetrics {
                tap_count: 16,
                taps_per_second: 4.0,
            },
            rhythm: TapRhythmMetrics {
                mean_interval_ms: 250.0,
                interval_cv: 0.05,
                regularity: 95.0,
            },
            fatigue: TapFatigueMetrics {
                mean_amplitude: 40.0,
                amplitude_slope: -0.5,
                frequency_slope: 0.0,
                declining: false,
            },
            quality: TapQualityMetrics {
                mean_spatial_precision: 92.0,
                mean_temporal_precision: 90.0,
                mean_precision: 91.0,
                mean_smoothness: 88.0,
                composite: 89.5,
            },
            sample_count: 119,
            window_secs: 3.96,
        }
    }

    #[test]
    fn test_encode_balance_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode_balance(&make_summary(), &make_balance_aggregate(), None);

        assert_eq!(report.schema, REPORT_SCHEMA_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, KINEMETRY_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.session.frames_processed, 120);
        assert!((report.overall_score - 88.0).abs() < 1e-9);

        match report.metrics {
            ReportMetrics::Balance {
                aggregate,
                comparison,
            } => {
                assert_eq!(aggregate.sample_count, 119);
                assert!(comparison.is_none());
            }
            ReportMetrics::FingerTap { .. } => panic!("expected balance metrics"),
        }
    }

    #[test]
    fn test_balance_report_carries_comparison() {
        let comparison = BalanceComparison {
            balance_change: 5.0,
            stability_change: 2.0,
            sway_change: 10.0,
            symmetry_change: 1.0,
            baseline_captured_at: Utc.timestamp_millis_opt(0).single().unwrap(),
        };

        let encoder = ReportEncoder::new();
        let report = encoder.encode_balance(
            &make_summary(),
            &make_balance_aggregate(),
            Some(comparison),
        );

        match report.metrics {
            ReportMetrics::Balance { comparison, .. } => {
                let comparison = comparison.unwrap();
                assert!((comparison.balance_change - 5.0).abs() < 1e-9);
            }
            ReportMetrics::FingerTap { .. } => panic!("expected balance metrics"),
        }
    }

    #[test]
    fn test_encode_tapping_report_scores_and_findings() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode_tapping(&make_summary(), &make_tap_aggregate(), None);

        // (91 precision + 95 regularity) / 2
        assert!((report.overall_score - 93.0).abs() < 1e-9);

        match report.metrics {
            ReportMetrics::FingerTap { findings, .. } => {
                assert_eq!(findings.len(), TAP_NORMAL_RANGES.len());
                for finding in &findings {
                    assert_eq!(finding.status, RangeStatus::Within);
                }
                let frequency = &findings[0];
                assert_eq!(frequency.metric, "tap_frequency");
                assert!((frequency.value - 4.0).abs() < 1e-9);
                assert_eq!(frequency.unit, "taps/sec");
            }
            ReportMetrics::Balance { .. } => panic!("expected tapping metrics"),
        }
    }

    #[test]
    fn test_tapping_findings_flag_out_of_range_values() {
        let mut aggregate = make_tap_aggregate();
        aggregate.frequency.taps_per_second = 2.0;
        aggregate.fatigue.mean_amplitude = 60.0;

        let encoder = ReportEncoder::new();
        let report = encoder.encode_tapping(&make_summary(), &aggregate, None);

        match report.metrics {
            ReportMetrics::FingerTap { findings, .. } => {
                assert_eq!(findings[0].status, RangeStatus::Below);
                assert_eq!(findings[1].status, RangeStatus::Above);
                assert_eq!(findings[2].status, RangeStatus::Within);
            }
            ReportMetrics::Balance { .. } => panic!("expected tapping metrics"),
        }
    }

    #[test]
    fn test_report_json_round_trip() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode_tapping(&make_summary(), &make_tap_aggregate(), None);

        let json = report.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["schema"], "assessment.report.v1");
        assert_eq!(parsed["metrics"]["assessment"], "finger_tap");
        assert!(parsed["metrics"]["findings"].is_array());

        let restored = AssessmentReport::from_json(&json).unwrap();
        assert_eq!(restored.schema, report.schema);
        assert!((restored.overall_score - report.overall_score).abs() < 1e-9);
    }
}
