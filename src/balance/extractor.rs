//! Per-frame balance metric extraction
//!
//! Pure derivation over one pose observation: sway from the nose's drift
//! against the ankle midline and shoulder height, weight split from ankle
//! confidence, stability from hip/shoulder alignment, and a composite
//! overall score. Detector dropouts degrade to the neutral record instead of
//! failing, so the per-frame loop survives transient tracking noise.

use crate::balance::types::{BalanceConfig, BalanceMetrics, PosturalSway, WeightDistribution};
use crate::session::MetricExtractor;
use crate::types::{Landmark, LandmarkName, Observation};

/// Landmarks the balance formulas require in every frame
pub const REQUIRED_LANDMARKS: [LandmarkName; 7] = [
    LandmarkName::Nose,
    LandmarkName::LeftHip,
    LandmarkName::RightHip,
    LandmarkName::LeftShoulder,
    LandmarkName::RightShoulder,
    LandmarkName::LeftAnkle,
    LandmarkName::RightAnkle,
];

/// Balance metric extractor.
///
/// Stateless apart from its configuration: the output is a pure function of
/// `(current, previous, delta_ms)`.
#[derive(Debug, Clone, Default)]
pub struct BalanceExtractor {
    config: BalanceConfig,
}

impl BalanceExtractor {
    pub fn new(config: BalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }
}

impl MetricExtractor for BalanceExtractor {
    type Metrics = BalanceMetrics;

    fn extract(
        &mut self,
        current: &Observation,
        previous: Option<&Observation>,
        _delta_ms: f64,
    ) -> Option<BalanceMetrics> {
        if previous.is_none() {
            return None;
        }

        let min = self.config.min_confidence;
        let nose = current.confident_landmark(&LandmarkName::Nose, min);
        let left_hip = current.confident_landmark(&LandmarkName::LeftHip, min);
        let right_hip = current.confident_landmark(&LandmarkName::RightHip, min);
        let left_shoulder = current.confident_landmark(&LandmarkName::LeftShoulder, min);
        let right_shoulder = current.confident_landmark(&LandmarkName::RightShoulder, min);
        let left_ankle = current.confident_landmark(&LandmarkName::LeftAnkle, min);
        let right_ankle = current.confident_landmark(&LandmarkName::RightAnkle, min);

        match (
            nose,
            left_hip,
            right_hip,
            left_shoulder,
            right_shoulder,
            left_ankle,
            right_ankle,
        ) {
            (Some(nose), Some(lh), Some(rh), Some(ls), Some(rs), Some(la), Some(ra)) => {
                Some(derive_metrics(nose, lh, rh, ls, rs, la, ra, &self.config))
            }
            _ => Some(BalanceMetrics::neutral()),
        }
    }

    fn reset(&mut self) {}
}

fn derive_metrics(
    nose: &Landmark,
    left_hip: &Landmark,
    right_hip: &Landmark,
    left_shoulder: &Landmark,
    right_shoulder: &Landmark,
    left_ankle: &Landmark,
    right_ankle: &Landmark,
    config: &BalanceConfig,
) -> BalanceMetrics {
    let hip_center_x = midpoint(left_hip.x, right_hip.x);
    let shoulder_center_x = midpoint(left_shoulder.x, right_shoulder.x);
    let shoulder_center_y = midpoint(left_shoulder.y, right_shoulder.y);
    let ankle_center_x = midpoint(left_ankle.x, right_ankle.x);

    let postural_sway = compute_sway(nose, ankle_center_x, shoulder_center_y);
    let weight_distribution = compute_weight_distribution(left_ankle, right_ankle);
    let stability_score =
        compute_stability(hip_center_x, shoulder_center_x, postural_sway.lateral, config);
    let overall_balance = compute_overall_balance(&postural_sway, &weight_distribution, config);

    BalanceMetrics {
        overall_balance,
        postural_sway,
        weight_distribution,
        stability_score,
    }
}

fn midpoint(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Lateral sway: nose drift from the ankle midline.
/// Anterior sway: nose drift from shoulder height.
fn compute_sway(nose: &Landmark, ankle_center_x: f64, shoulder_center_y: f64) -> PosturalSway {
    PosturalSway {
        lateral: (nose.x - ankle_center_x).abs(),
        anterior: (nose.y - shoulder_center_y).abs(),
    }
}

/// Left/right load split from the left ankle's confidence, scaled to 0-100
/// and clamped. Degenerate ankle geometry (equal x) yields an even split.
fn compute_weight_distribution(
    left_ankle: &Landmark,
    right_ankle: &Landmark,
) -> WeightDistribution {
    if (left_ankle.x - right_ankle.x).abs() < f64::EPSILON {
        return WeightDistribution {
            left: 50.0,
            right: 50.0,
        };
    }

    let left = (left_ankle.confidence * 100.0).clamp(0.0, 100.0);
    WeightDistribution {
        left,
        right: 100.0 - left,
    }
}

/// `100 - (|hip_center.x - shoulder_center.x| * alignment_weight
///       + lateral_sway * stability_sway_weight)`, clamped to [0, 100]
fn compute_stability(
    hip_center_x: f64,
    shoulder_center_x: f64,
    lateral_sway: f64,
    config: &BalanceConfig,
) -> f64 {
    let alignment_offset = (hip_center_x - shoulder_center_x).abs();
    let penalty =
        alignment_offset * config.alignment_weight + lateral_sway * config.stability_sway_weight;
    (100.0 - penalty).clamp(0.0, 100.0)
}

/// `100 - ((lateral + anterior) * sway_penalty_weight
///       + |left - right| / imbalance_divisor)`, clamped to [0, 100]
fn compute_overall_balance(
    sway: &PosturalSway,
    weight: &WeightDistribution,
    config: &BalanceConfig,
) -> f64 {
    let sway_penalty = (sway.lateral + sway.anterior) * config.sway_penalty_weight;
    let imbalance_penalty = (weight.left - weight.right).abs() / config.imbalance_divisor;
    (100.0 - (sway_penalty + imbalance_penalty)).clamp(0.0, 100.0)
}
