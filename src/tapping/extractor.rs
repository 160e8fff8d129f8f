//! Per-frame tapping metric extraction
//!
//! Tracks the thumb-tip to index-tip aperture across consecutive hand
//! observations. Aperture and its first derivative come straight from the
//! frame pair; acceleration, jerk, trajectory shape, and inter-tap timing
//! need a short memory of prior frames, which the extractor carries between
//! calls. That memory holds no wall-clock state: resetting and replaying the
//! same observation sequence reproduces the same records. Detector dropouts
//! degrade to the neutral record and leave the memory untouched.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::session::MetricExtractor;
use crate::tapping::types::{MovementPrecision, TapCharacteristics, TapConfig, TapMetrics};
use crate::types::{LandmarkName, Observation, Point3};

/// Recent index-fingertip positions retained for the trajectory
pub const TRAJECTORY_CAPACITY: usize = 8;

/// Landmarks the tapping formulas require in every frame
pub const REQUIRED_LANDMARKS: [LandmarkName; 2] =
    [LandmarkName::ThumbTip, LandmarkName::IndexFingerTip];

/// Finger-tapping metric extractor
#[derive(Debug, Clone, Default)]
pub struct TapExtractor {
    config: TapConfig,
    last_velocity: Option<f64>,
    last_acceleration: Option<f64>,
    trajectory: VecDeque<Point3>,
    last_onset: Option<DateTime<Utc>>,
    last_interval_ms: Option<f64>,
    was_in_contact: bool,
}

impl TapExtractor {
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            last_velocity: None,
            last_acceleration: None,
            trajectory: VecDeque::with_capacity(TRAJECTORY_CAPACITY),
            last_onset: None,
            last_interval_ms: None,
            was_in_contact: false,
        }
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    fn fingertips(&self, obs: &Observation) -> Option<(Point3, Point3)> {
        let thumb = obs.confident_landmark(&LandmarkName::ThumbTip, self.config.min_confidence)?;
        let index =
            obs.confident_landmark(&LandmarkName::IndexFingerTip, self.config.min_confidence)?;
        Some((thumb.point(), index.point()))
    }
}

impl MetricExtractor for TapExtractor {
    type Metrics = TapMetrics;

    fn extract(
        &mut self,
        current: &Observation,
        previous: Option<&Observation>,
        delta_ms: f64,
    ) -> Option<TapMetrics> {
        let previous = previous?;

        let (thumb, index) = match self.fingertips(current) {
            Some(tips) => tips,
            None => return Some(TapMetrics::neutral()),
        };

        let amplitude = thumb.distance(&index);
        let dt_s = delta_ms / 1000.0;

        let velocity = match (self.fingertips(previous), dt_s > 0.0) {
            (Some((prev_thumb, prev_index)), true) => {
                (amplitude - prev_thumb.distance(&prev_index)) / dt_s
            }
            _ => 0.0,
        };

        let acceleration = match self.last_velocity {
            Some(last) if dt_s > 0.0 => (velocity - last) / dt_s,
            _ => 0.0,
        };

        let jerk = match self.last_acceleration {
            Some(last) if dt_s > 0.0 => (acceleration - last) / dt_s,
            _ => 0.0,
        };
        let smoothness = 100.0 * (-jerk.abs() / self.config.jerk_scale).exp();

        if self.trajectory.len() == TRAJECTORY_CAPACITY {
            self.trajectory.pop_front();
        }
        self.trajectory.push_back(index);
        let trajectory: Vec<Point3> = self.trajectory.iter().copied().collect();

        let spatial = spatial_precision(&trajectory, self.config.spatial_scale);

        let in_contact = amplitude < self.config.contact_threshold;
        if in_contact && !self.was_in_contact {
            if let Some(last_onset) = self.last_onset {
                self.last_interval_ms = Some(millis_between(current.timestamp, last_onset));
            }
            self.last_onset = Some(current.timestamp);
        }
        self.was_in_contact = in_contact;

        let (temporal, target_deviation) = match self.last_interval_ms {
            Some(interval) => {
                let deviation = (interval - self.config.target_interval_ms).abs();
                let score = (100.0 - deviation * self.config.temporal_penalty).clamp(0.0, 100.0);
                (score, deviation)
            }
            None => (0.0, 0.0),
        };

        let tap_force = if in_contact {
            ((-velocity).max(0.0) / self.config.force_scale).clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.last_velocity = Some(velocity);
        self.last_acceleration = Some(acceleration);

        Some(TapMetrics {
            tap_characteristics: TapCharacteristics {
                velocity,
                amplitude,
                acceleration,
                trajectory,
            },
            movement_precision: MovementPrecision {
                spatial,
                temporal,
                target_deviation,
            },
            tap_force,
            smoothness,
        })
    }

    fn reset(&mut self) {
        self.last_velocity = None;
        self.last_acceleration = None;
        self.trajectory.clear();
        self.last_onset = None;
        self.last_interval_ms = None;
        self.was_in_contact = false;
    }
}

fn millis_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// Straightness of the recent fingertip path in [0, 100].
///
/// Scores the mean perpendicular deviation of interior trajectory points
/// from the chord between its endpoints; 100 until three points exist.
fn spatial_precision(trajectory: &[Point3], scale: f64) -> f64 {
    if trajectory.len() < 3 {
        return 100.0;
    }

    let first = trajectory[0];
    let last = trajectory[trajectory.len() - 1];
    let chord_length = first.distance(&last);

    let deviations: Vec<f64> = trajectory[1..trajectory.len() - 1]
        .iter()
        .map(|point| {
            if chord_length < f64::EPSILON {
                point.distance(&first)
            } else {
                point_to_chord(point, &first, &last, chord_length)
            }
        })
        .collect();

    let mean_deviation = deviations.iter().sum::<f64>() / deviations.len() as f64;
    100.0 * (-mean_deviation / scale).exp()
}

fn point_to_chord(point: &Point3, start: &Point3, end: &Point3, chord_length: f64) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let dz = end.z - start.z;
    let px = point.x - start.x;
    let py = point.y - start.y;
    let pz = point.z - start.z;

    // |(P - A) x (B - A)| / |B - A|
    let cross_x = py * dz - pz * dy;
    let cross_y = pz * dx - px * dz;
    let cross_z = px * dy - py * dx;
    (cross_x * cross_x + cross_y * cross_y + cross_z * cross_z).sqrt() / chord_length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    /// Thumb at the origin, index fingertip `aperture` along x.
    fn hand_frame(ts_ms: i64, aperture: f64) -> Observation {
        Observation::new(
            Utc.timestamp_millis_opt(ts_ms).single().unwrap(),
            vec![
                Landmark::new(LandmarkName::ThumbTip, 0.0, 0.0, 0.9),
                Landmark::new(LandmarkName::IndexFingerTip, aperture, 0.0, 0.9),
            ],
        )
    }

    fn run_sequence(extractor: &mut TapExtractor, frames: &[Observation]) -> Vec<TapMetrics> {
        let mut records = Vec::new();
        for i in 0..frames.len() {
            let previous = if i == 0 { None } else { Some(&frames[i - 1]) };
            let delta_ms = previous.map_or(0.0, |prev| frames[i].delta_ms(prev));
            if let Some(metrics) = extractor.extract(&frames[i], previous, delta_ms) {
                records.push(metrics);
            }
        }
        records
    }

    #[test]
    fn test_first_frame_yields_none() {
        let mut extractor = TapExtractor::default();
        let frame = hand_frame(0, 50.0);
        assert!(extractor.extract(&frame, None, 0.0).is_none());
    }

    #[test]
    fn test_amplitude_and_velocity_from_aperture() {
        let mut extractor = TapExtractor::default();
        let frames = [hand_frame(0, 50.0), hand_frame(100, 40.0)];
        let records = run_sequence(&mut extractor, &frames);

        assert_eq!(records.len(), 1);
        let m = &records[0];
        assert!((m.tap_characteristics.amplitude - 40.0).abs() < 1e-9);
        // (40 - 50) / 0.1 s
        assert!((m.tap_characteristics.velocity - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_acceleration_and_smoothness_series() {
        let mut extractor = TapExtractor::default();
        let frames = [
            hand_frame(0, 50.0),
            hand_frame(100, 40.0),
            hand_frame(200, 35.0),
        ];
        let records = run_sequence(&mut extractor, &frames);

        // First record has no velocity history
        assert!((records[0].tap_characteristics.acceleration - 0.0).abs() < 1e-9);
        assert!((records[0].smoothness - 100.0).abs() < 1e-9);

        // (-50 - (-100)) / 0.1 s
        assert!((records[1].tap_characteristics.acceleration - 500.0).abs() < 1e-9);
        // jerk = (500 - 0) / 0.1 = 5000, one decay scale
        let expected = 100.0 * (-1.0f64).exp();
        assert!((records[1].smoothness - expected).abs() < 1e-9);
    }

    #[test]
    fn test_contact_onset_sets_interval_metrics() {
        let mut extractor = TapExtractor::default();
        let frames = [
            hand_frame(0, 50.0),
            hand_frame(100, 20.0),
            hand_frame(200, 50.0),
            hand_frame(300, 20.0),
        ];
        let records = run_sequence(&mut extractor, &frames);

        // First onset: no prior onset, so no interval yet
        assert!((records[0].movement_precision.temporal - 0.0).abs() < 1e-9);
        assert!((records[0].movement_precision.target_deviation - 0.0).abs() < 1e-9);
        assert!((records[0].tap_force - 1.0).abs() < 1e-9);

        // Open hand carries no force
        assert!((records[1].tap_force - 0.0).abs() < 1e-9);

        // Second onset 200 ms after the first hits the target exactly
        assert!((records[2].movement_precision.temporal - 100.0).abs() < 1e-9);
        assert!((records[2].movement_precision.target_deviation - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_deviation_penalizes_temporal_precision() {
        let mut extractor = TapExtractor::default();
        let frames = [
            hand_frame(0, 50.0),
            hand_frame(100, 20.0),
            hand_frame(250, 50.0),
            hand_frame(400, 20.0),
        ];
        let records = run_sequence(&mut extractor, &frames);

        // Onsets 300 ms apart against a 200 ms target
        let last = &records[2].movement_precision;
        assert!((last.target_deviation - 100.0).abs() < 1e-9);
        assert!((last.temporal - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fingertip_degrades_to_neutral() {
        let mut extractor = TapExtractor::default();
        let dropout = Observation::new(
            Utc.timestamp_millis_opt(200).single().unwrap(),
            vec![Landmark::new(LandmarkName::ThumbTip, 0.0, 0.0, 0.9)],
        );
        let frames = [
            hand_frame(0, 50.0),
            hand_frame(100, 40.0),
            dropout,
            hand_frame(300, 30.0),
        ];
        let records = run_sequence(&mut extractor, &frames);

        assert_eq!(records.len(), 3);
        let neutral = serde_json::to_value(TapMetrics::neutral()).unwrap();
        assert_eq!(serde_json::to_value(&records[1]).unwrap(), neutral);

        // The dropout left the trajectory memory untouched
        assert_eq!(records[2].tap_characteristics.trajectory.len(), 2);
    }

    #[test]
    fn test_low_confidence_fingertip_degrades_to_neutral() {
        let mut extractor = TapExtractor::default();
        let faint = Observation::new(
            Utc.timestamp_millis_opt(100).single().unwrap(),
            vec![
                Landmark::new(LandmarkName::ThumbTip, 0.0, 0.0, 0.9),
                Landmark::new(LandmarkName::IndexFingerTip, 40.0, 0.0, 0.1),
            ],
        );
        let frames = [hand_frame(0, 50.0), faint];
        let records = run_sequence(&mut extractor, &frames);

        let neutral = serde_json::to_value(TapMetrics::neutral()).unwrap();
        assert_eq!(serde_json::to_value(&records[0]).unwrap(), neutral);
    }

    #[test]
    fn test_trajectory_keeps_most_recent_positions() {
        let mut extractor = TapExtractor::default();
        let frames: Vec<Observation> =
            (0..13).map(|i| hand_frame(i * 100, i as f64)).collect();
        let records = run_sequence(&mut extractor, &frames);

        let trajectory = &records.last().unwrap().tap_characteristics.trajectory;
        assert_eq!(trajectory.len(), TRAJECTORY_CAPACITY);
        assert!((trajectory[0].x - 5.0).abs() < 1e-9);
        assert!((trajectory[TRAJECTORY_CAPACITY - 1].x - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_path_scores_full_spatial_precision() {
        let mut extractor = TapExtractor::default();
        let frames: Vec<Observation> =
            (0..6).map(|i| hand_frame(i * 100, 30.0 + i as f64)).collect();
        let records = run_sequence(&mut extractor, &frames);

        // Collinear fingertip positions deviate nowhere from the chord
        assert!((records.last().unwrap().movement_precision.spatial - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_jagged_path_loses_spatial_precision() {
        let mut extractor = TapExtractor::default();
        let frames: Vec<Observation> = (0..6)
            .map(|i| {
                let ts = Utc.timestamp_millis_opt(i * 100).single().unwrap();
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                Observation::new(
                    ts,
                    vec![
                        Landmark::new(LandmarkName::ThumbTip, 0.0, 0.0, 0.9),
                        Landmark::new(LandmarkName::IndexFingerTip, 40.0 + i as f64, sign * 20.0, 0.9),
                    ],
                )
            })
            .collect();
        let records = run_sequence(&mut extractor, &frames);

        assert!(records.last().unwrap().movement_precision.spatial < 100.0);
    }

    #[test]
    fn test_zero_delta_yields_zero_rates() {
        let mut extractor = TapExtractor::default();
        let first = hand_frame(0, 50.0);
        let second = hand_frame(0, 40.0);
        let metrics = extractor
            .extract(&second, Some(&first), 0.0)
            .unwrap();

        assert!((metrics.tap_characteristics.velocity - 0.0).abs() < 1e-9);
        assert!((metrics.tap_characteristics.acceleration - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_replay_after_reset_reproduces_records() {
        let mut extractor = TapExtractor::default();
        let frames: Vec<Observation> = (0..10)
            .map(|i| hand_frame(i * 100, if i % 3 == 0 { 20.0 } else { 45.0 + i as f64 }))
            .collect();

        let first_run = serde_json::to_string(&run_sequence(&mut extractor, &frames)).unwrap();
        extractor.reset();
        let second_run = serde_json::to_string(&run_sequence(&mut extractor, &frames)).unwrap();

        assert_eq!(first_run, second_run);
    }
}
