use super::runner::RunSummary;
use crate::types::EngineKind;
use std::sync::mpsc::Sender;

/// Snapshot reported after every completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepProgress {
    pub kind: EngineKind,
    pub step: usize,
    pub max_steps: usize,
    /// Cost recorded for this step.
    pub step_cost: f64,
    pub best_cost: f64,
    pub best_features: Vec<String>,
    pub no_improvement_counter: usize,
}

pub trait ProgressCallback: Send {
    fn on_run_start(&mut self, _kind: EngineKind, _max_steps: usize) {}
    fn on_step_complete(&mut self, progress: &StepProgress);
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_run_start(&mut self, kind: EngineKind, max_steps: usize) {
        log::info!("Starting {:?} search for up to {} steps", kind, max_steps);
    }

    fn on_step_complete(&mut self, progress: &StepProgress) {
        log::info!(
            "{} {}/{} complete. Step p-value: {:.6}, best: {:.6} with {} features",
            progress.kind.step_label(),
            progress.step,
            progress.max_steps,
            progress.step_cost,
            progress.best_cost,
            progress.best_features.len()
        );
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        log::info!(
            "Search finished after {} steps ({:?}). Best p-value: {:.6}",
            summary.steps,
            summary.stop_reason,
            summary.best_cost
        );
    }
}

/// Forwards step snapshots to another thread.
pub struct ChannelProgressCallback {
    sender: Sender<StepProgress>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<StepProgress>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_step_complete(&mut self, progress: &StepProgress) {
        // A dropped receiver only means nobody is watching.
        let _ = self.sender.send(progress.clone());
    }
}
