//! Balance assessment session assembly
//!
//! `BalanceSession` wires the extractor, history, aggregator, and baseline
//! into the session lifecycle: run the frame loop, pull windowed aggregates
//! on demand, capture or restore a baseline, and compare against it.

use crate::balance::aggregator::BalanceAggregator;
use crate::balance::baseline::{compare, BalanceBaseline};
use crate::balance::extractor::BalanceExtractor;
use crate::balance::types::{BalanceAggregate, BalanceComparison, BalanceConfig, BalanceMetrics};
use crate::error::AnalysisError;
use crate::history::HistoryBuffer;
use crate::session::{
    AssessmentSession, FrameSource, ReplayFrameSource, SessionHandle, SessionState, SessionSummary,
};
use crate::types::Observation;
use crate::DEFAULT_AGGREGATION_WINDOW_MS;
use chrono::Duration;

/// A standing-balance assessment session
pub struct BalanceSession {
    session: AssessmentSession<BalanceExtractor>,
    window: Duration,
    baseline: Option<BalanceBaseline>,
}

impl BalanceSession {
    /// Session with default calibration and the default aggregation window
    pub fn new() -> Self {
        Self::with_config(BalanceConfig::default())
    }

    pub fn with_config(config: BalanceConfig) -> Self {
        Self::with_window(config, Duration::milliseconds(DEFAULT_AGGREGATION_WINDOW_MS))
    }

    pub fn with_window(config: BalanceConfig, window: Duration) -> Self {
        Self {
            session: AssessmentSession::new(BalanceExtractor::new(config)),
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
        F: FnMut(&BalanceMetrics),
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

    pub fn history(&self) -> &HistoryBuffer<BalanceMetrics> {
        self.session.history()
    }

    pub fn clear_history(&mut self) {
        self.session.clear_history();
    }

    pub fn aggregation_window(&self) -> Duration {
        self.window
    }

    /// Aggregate the default window of recent history
    pub fn aggregate(&self) -> BalanceAggregate {
        self.aggregate_window(self.window)
    }

    /// Aggregate an explicit window of recent history
    pub fn aggregate_window(&self, window: Duration) -> BalanceAggregate {
        BalanceAggregator::aggregate(&self.session.history().recent(window))
    }

    /// Freeze the current window's aggregate as the baseline.
    ///
    /// Errors when the window holds no records yet.
    pub fn capture_baseline(&mut self) -> Result<BalanceBaseline, AnalysisError> {
        let entries = self.session.history().recent(self.window);
        if entries.is_empty() {
            return Err(AnalysisError::InsufficientHistory(
                "balance baseline needs at least one record in the window".to_string(),
            ));
        }

        let aggregate = BalanceAggregator::aggregate(&entries);
        let window_secs = self.window.num_milliseconds() as f64 / 1000.0;
        let baseline = BalanceBaseline::capture(aggregate, window_secs);
        self.baseline = Some(baseline.clone());
        Ok(baseline)
    }

    pub fn set_baseline(&mut self, baseline: BalanceBaseline) {
        self.baseline = Some(baseline);
    }

    pub fn baseline(&self) -> Option<&BalanceBaseline> {
        self.baseline.as_ref()
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    /// Compare the current window against the baseline; `None` until a
    /// baseline is set
    pub fn compare_to_baseline(&self) -> Option<BalanceComparison> {
        compare(&self.aggregate(), self.baseline.as_ref())
    }

    /// Restore a baseline persisted by the embedder
    pub fn load_baseline_json(&mut self, json: &str) -> Result<(), AnalysisError> {
        self.baseline = Some(BalanceBaseline::from_json(json)?);
        Ok(())
    }

    /// Serialize the current baseline for persistence
    pub fn save_baseline_json(&self) -> Result<String, AnalysisError> {
        match &self.baseline {
            Some(baseline) => baseline.to_json(),
            None => Err(AnalysisError::InsufficientHistory(
                "no balance baseline captured".to_string(),
            )),
        }
    }
}

impl Default for BalanceSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of replaying a recorded observation sequence
#[derive(Debug, Clone)]
pub struct BalanceRecordingAnalysis {
    /// One record per frame that produced metrics
    pub records: Vec<BalanceMetrics>,
    /// Aggregate over the final window
    pub aggregate: BalanceAggregate,
    pub summary: SessionSummary,
}

/// Replay a recorded observation sequence through a fresh session
pub fn analyze_recording(
    observations: Vec<Observation>,
    config: BalanceConfig,
    window: Duration,
) -> Result<BalanceRecordingAnalysis, AnalysisError> {
    let mut session = BalanceSession::with_window(config, window);
    let mut source = ReplayFrameSource::new(observations);

    let mut records = Vec::new();
    let summary = session.start(&mut source, |metrics| records.push(metrics.clone()))?;
    let aggregate = session.aggregate();

    Ok(BalanceRecordingAnalysis {
        records,
        aggregate,
        summary,
    })
}
