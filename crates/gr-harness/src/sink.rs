//! Observation boundary for live rollout consumers.

use gr_results::StepRecord;

/// Receives both lanes' freshly appended records after each step.
///
/// A sink is purely an observer: it cannot influence the rollout, and
/// the rollout does not care where the records end up (terminal
/// rendering, test capture, nothing at all).
pub trait RolloutSink {
    fn on_step(&mut self, optimization: &StepRecord, projection: &StepRecord);
}

/// Discards everything.
pub struct NullSink;

impl RolloutSink for NullSink {
    fn on_step(&mut self, _optimization: &StepRecord, _projection: &StepRecord) {}
}

/// Collects record pairs in memory, for tests and buffered consumers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub steps: Vec<(StepRecord, StepRecord)>,
}

impl RolloutSink for MemorySink {
    fn on_step(&mut self, optimization: &StepRecord, projection: &StepRecord) {
        self.steps.push((*optimization, *projection));
    }
}
