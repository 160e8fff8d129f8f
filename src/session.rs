//! Assessment session lifecycle
//!
//! A session owns the per-frame loop for one assessment: it pulls
//! observations from a frame source, feeds them to a metric extractor with
//! the previous observation retained for delta computation, appends extracted
//! records to history, and hands each record to the caller's update callback.
//!
//! Sessions are explicit objects constructed per assessment; there is no
//! shared global state. Cancellation goes through a `SessionHandle`, a
//! cloneable token that is safe to trigger from inside the update callback.

use crate::error::AnalysisError;
use crate::history::{HistoryBuffer, HistoryEntry};
use crate::types::Observation;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cap on per-run issue records kept in the session summary
const MAX_RECORDED_ISSUES: usize = 32;

/// Turns consecutive observations into instantaneous metrics records.
///
/// `extract` returns `None` when no record can be produced for the frame
/// (always the case when `previous` is absent). Implementations may keep
/// short kinematic state across frames; `reset` clears it so a replayed
/// observation sequence reproduces the same output.
pub trait MetricExtractor {
    type Metrics: Clone;

    fn extract(
        &mut self,
        current: &Observation,
        previous: Option<&Observation>,
        delta_ms: f64,
    ) -> Option<Self::Metrics>;

    fn reset(&mut self);
}

/// Supplies one observation per tick.
///
/// Implementations must yield observations in non-decreasing timestamp order.
/// `Ok(None)` signals the end of the stream; an `Err` marks a single bad
/// frame and does not end the session.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Observation>, AnalysisError>;
}

/// Frame source over a recorded observation sequence
pub struct ReplayFrameSource {
    frames: std::vec::IntoIter<Observation>,
}

impl ReplayFrameSource {
    pub fn new(frames: Vec<Observation>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for ReplayFrameSource {
    fn next_frame(&mut self) -> Result<Option<Observation>, AnalysisError> {
        Ok(self.frames.next())
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// Cancellation token for a session's frame loop.
///
/// Cloneable and `Send + Sync`; `stop` is idempotent and safe to call from
/// inside the update callback. The loop re-checks the token at every frame
/// boundary, so no further update callback runs after `stop` returns on the
/// session's own thread.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cancelled: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation of the current run
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn rearm(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// One structured diagnostic captured during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameIssue {
    /// Zero-based index of the offending frame in the source stream
    pub frame_index: u64,
    pub detail: String,
}

/// Statistics for one completed session run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Frames accepted from the source
    pub frames_processed: u64,
    /// Metrics records appended to history and delivered to the callback
    pub records_emitted: u64,
    /// Frame-source errors survived by the loop
    pub source_errors: u64,
    /// Frames dropped for stepping backwards in time
    pub out_of_order_dropped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<DateTime<Utc>>,
    /// True when the run ended through the session handle rather than
    /// source exhaustion
    pub stopped_early: bool,
    /// Capped list of per-frame diagnostics
    pub issues: Vec<FrameIssue>,
}

impl SessionSummary {
    fn record_issue(&mut self, frame_index: u64, detail: String) {
        if self.issues.len() < MAX_RECORDED_ISSUES {
            self.issues.push(FrameIssue {
                frame_index,
                detail,
            });
        }
    }
}

/// Generic assessment session: state machine plus frame loop.
///
/// The balance and tapping pipelines wrap this with their aggregators and
/// baselines; the session itself only knows the extractor and the history.
pub struct AssessmentSession<X: MetricExtractor> {
    extractor: X,
    state: SessionState,
    previous: Option<Observation>,
    history: HistoryBuffer<X::Metrics>,
    handle: SessionHandle,
}

impl<X: MetricExtractor> AssessmentSession<X> {
    pub fn new(extractor: X) -> Self {
        Self {
            extractor,
            state: SessionState::Idle,
            previous: None,
            history: HistoryBuffer::new(),
            handle: SessionHandle::new(),
        }
    }

    /// Create a session whose history keeps `retention` worth of entries
    pub fn with_retention(extractor: X, retention: Duration) -> Self {
        Self {
            history: HistoryBuffer::with_retention(retention),
            ..Self::new(extractor)
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Cancellation token for the current and future runs
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn history(&self) -> &HistoryBuffer<X::Metrics> {
        &self.history
    }

    /// Drop accumulated history (baselines and state are unaffected)
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Run the frame loop until the source is exhausted or the handle stops
    /// the session.
    ///
    /// Each accepted frame is extracted against the retained previous
    /// observation; non-`None` records are appended to history and passed to
    /// `on_update`. Frame-source errors and out-of-order frames are counted
    /// on the summary and skipped. Starting resets the previous observation
    /// and the extractor state, so the first frame of every run yields no
    /// record.
    pub fn start<S, F>(
        &mut self,
        source: &mut S,
        mut on_update: F,
    ) -> Result<SessionSummary, AnalysisError>
    where
        S: FrameSource,
        F: FnMut(&X::Metrics),
    {
        if self.state == SessionState::Running {
            return Err(AnalysisError::SessionAlreadyRunning);
        }

        self.previous = None;
        self.extractor.reset();
        self.handle.rearm();
        self.state = SessionState::Running;

        let mut summary = SessionSummary::default();
        let mut frame_index: u64 = 0;

        loop {
            if self.handle.is_stopped() {
                summary.stopped_early = true;
                break;
            }

            let observation = match source.next_frame() {
                Ok(Some(obs)) => obs,
                Ok(None) => break,
                Err(err) => {
                    summary.source_errors += 1;
                    summary.record_issue(frame_index, err.to_string());
                    frame_index += 1;
                    continue;
                }
            };

            if let Some(previous) = &self.previous {
                if observation.timestamp < previous.timestamp {
                    summary.out_of_order_dropped += 1;
                    frame_index += 1;
                    continue;
                }
            }

            summary.frames_processed += 1;
            if summary.first_timestamp.is_none() {
                summary.first_timestamp = Some(observation.timestamp);
            }
            summary.last_timestamp = Some(observation.timestamp);

            let timestamp = observation.timestamp;
            let delta_ms = self
                .previous
                .as_ref()
                .map(|prev| observation.delta_ms(prev))
                .unwrap_or(0.0);

            let metrics = self
                .extractor
                .extract(&observation, self.previous.as_ref(), delta_ms);
            self.previous = Some(observation);

            if let Some(metrics) = metrics {
                if self.history.append(HistoryEntry::new(timestamp, metrics.clone())) {
                    summary.records_emitted += 1;
                    on_update(&metrics);
                } else {
                    summary.out_of_order_dropped += 1;
                }
            }

            frame_index += 1;
        }

        self.state = SessionState::Stopped;
        Ok(summary)
    }

    /// Stop the session.
    ///
    /// No-op when the session is not running; calling it repeatedly is safe.
    pub fn stop(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Stopped;
        }
        self.handle.stop();
    }
}
