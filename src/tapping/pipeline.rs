//! Tapping assessment session assembly
//!
//! `TapSession` wires the extractor, history, aggregator, and baseline into
//! the session lifecycle. One `TapConfig` calibrates both the per-frame
//! extraction and the windowed reduction.

use crate::error::AnalysisError;
use crate::history::HistoryBuffer;
use crate::session::{
    AssessmentSession, FrameSource, ReplayFrameSource, SessionHandle, SessionState, SessionSummary,
};
use crate::tapping::aggregator::TapAggregator;
use crate::tapping::baseline::{compare, TapBaseline};
use crate::tapping::extractor::TapExtractor;
use crate::tapping::types::{TapAggregate, TapComparison, TapConfig, TapMetrics};
use crate::types::Observation;
use crate::DEFAULT_AGGREGATION_WINDOW_MS;
use chrono::Duration;

/// A finger-tapping assessment session
pub struct TapSession {
    session: AssessmentSession<TapExtractor>,
    aggregator: TapAggregator,
    window: Duration,
    baseline: Option<TapBaseline>,
}

impl TapSession {
    /// Session with default calibration and the default aggregation window
    pub fn new() -> Self {
        Self::with_config(TapConfig::default())
    }

    pub fn with_config(config: TapConfig) -> Self {
        Self::with_window(config, Duration::milliseconds(DEFAULT_AGGREGATION_WINDOW_MS))
    }

    pub fn with_window(config: TapConfig, window: Duration) -> Self {
        Self {
            session: AssessmentSession::new(TapExtractor::new(config.clone())),
            aggregator: TapAggregator::new(config),
            window,
            baseline: None,
        }
    }

    /// Run the frame loop until the source ends or the handle stops it
    pub fn start<S, F>(
        &mut self,
        source: &mut S,
        on_update: F,
    ) -> Result<SessionSummary, AnalysisError>
    where
        S: FrameSource,
        F: FnMut(&TapMetrics),
    {
        self.session.start(source, on_update)
    }

    /// Stop the session; a no-op when not running
    pub fn stop(&mut self) {
        self.session.stop();
    }

    /// Cancellation token, safe to trigger from the update callback
    pub fn handle(&self) -> SessionHandle {
        self.session.handle()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn history(&self) -> &HistoryBuffer<TapMetrics> {
        self.session.history()
    }

    pub fn clear_history(&mut self) {
        self.session.clear_history();
    }

    pub fn aggregation_window(&self) -> Duration {
        self.window
    }

    /// Aggregate the default window of recent history
    pub fn aggregate(&self) -> TapAggregate {
        self.aggregate_window(self.window)
    }

    /// Aggregate an explicit window of recent history
    pub fn aggregate_window(&self, window: Duration) -> TapAggregate {
        self.aggregator
            .aggregate(&self.session.history().recent(window))
    }

    /// Freeze the current window's aggregate as the baseline.
    ///
    /// Errors when the window holds no records yet.
    pub fn capture_baseline(&mut self) -> Result<TapBaseline, AnalysisError> {
        let entries = self.session.history().recent(self.window);
        if entries.is_empty() {
            return Err(AnalysisError::InsufficientHistory(
                "tapping baseline needs at least one record in the window".to_string(),
            ));
        }

        let aggregate = self.aggregator.aggregate(&entries);
        let window_secs = self.window.num_milliseconds() as f64 / 1000.0;
        let baseline = TapBaseline::capture(aggregate, window_secs);
        self.baseline = Some(baseline.clone());
        Ok(baseline)
    }

    pub fn set_baseline(&mut self, baseline: TapBaseline) {
        self.baseline = Some(baseline);
    }

    pub fn baseline(&self) -> Option<&TapBaseline> {
        self.baseline.as_ref()
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    /// Compare the current window against the baseline; `None` until a
    /// baseline is set
    pub fn compare_to_baseline(&self) -> Option<TapComparison> {
        compare(&self.aggregate(), self.baseline.as_ref())
    }

    /// Restore a baseline persisted by the embedder
    pub fn load_baseline_json(&mut self, json: &str) -> Result<(), AnalysisError> {
        self.baseline = Some(TapBaseline::from_json(json)?);
        Ok(())
    }

    /// Serialize the current baseline for persistence
    pub fn save_baseline_json(&self) -> Result<String, AnalysisError> {
        match &self.baseline {
            Some(baseline) => baseline.to_json(),
            None => Err(AnalysisError::InsufficientHistory(
                "no tapping baseline captured".to_string(),
            )),
        }
    }
}

impl Default for TapSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of replaying a recorded observation sequence
#[derive(Debug, Clone)]
pub struct TapRecordingAnalysis {
    /// One record per frame that produced metrics
    pub records: Vec<TapMetrics>,
    /// Aggregate over the final window
    pub aggregate: TapAggregate,
    pub summary: SessionSummary,
}

/// Replay a recorded observation sequence through a fresh session
pub fn analyze_recording(
    observations: Vec<Observation>,
    config: TapConfig,
    window: Duration,
) -> Result<TapRecordingAnalysis, AnalysisError> {
    let mut session = TapSession::with_window(config, window);
    let mut source = ReplayFrameSource::new(observations);

    let mut records = Vec::new();
    let summary = session.start(&mut source, |metrics| records.push(metrics.clone()))?;
    let aggregate = session.aggregate();

    Ok(TapRecordingAnalysis {
        records,
        aggregate,
        summary,
    })
}
