use super::progress::{ChannelProgressCallback, ProgressCallback, StepProgress};
use super::SearchEngine;
use crate::error::{Result, SearchmiError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cancel and pause flags shared between a running search and its owner.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancel: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StepLimit,
    Stagnation,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Steps taken by this run (not counting steps restored from a checkpoint).
    pub steps: usize,
    pub last_step: Option<usize>,
    pub best_cost: f64,
    pub best_features: Vec<String>,
    pub stop_reason: StopReason,
}

/// Drives an engine one step at a time until the step limit, the stop
/// policy or a cancellation ends the run. Pausing holds the loop between
/// two steps.
///
/// `max_steps` counts every step of the engine, so a restored engine only
/// runs the remainder.
pub struct SearchRunner {
    max_steps: usize,
    control: RunControl,
}

impl SearchRunner {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            control: RunControl::new(),
        }
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    fn next_stop<E: SearchEngine + ?Sized>(&self, engine: &E) -> Option<StopReason> {
        let completed = engine.current_step().map_or(0, |s| s + 1);
        if completed >= self.max_steps {
            return Some(StopReason::StepLimit);
        }
        if completed > 0 && engine.should_stop() {
            return Some(StopReason::Stagnation);
        }
        if self.control.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        None
    }

    pub fn run<E, C>(&self, engine: &mut E, callback: &mut C) -> Result<RunSummary>
    where
        E: SearchEngine + ?Sized,
        C: ProgressCallback + ?Sized,
    {
        callback.on_run_start(engine.kind(), self.max_steps);
        let mut steps = 0;

        let stop_reason = loop {
            while self.control.is_paused() && !self.control.is_cancelled() {
                thread::sleep(PAUSE_POLL_INTERVAL);
            }

            if let Some(reason) = self.next_stop(engine) {
                break reason;
            }

            engine.run_one_iteration()?;
            steps += 1;

            if let (Some(step), Some(record)) = (engine.current_step(), engine.history().latest()) {
                callback.on_step_complete(&StepProgress {
                    kind: engine.kind(),
                    step,
                    max_steps: self.max_steps,
                    step_cost: record.best_cost,
                    best_cost: engine.best_cost(),
                    best_features: engine.best_features(),
                    no_improvement_counter: engine.no_improvement_counter(),
                });
            }
        };

        if stop_reason == StopReason::Stagnation {
            log::info!(
                "No improvement for {} steps, stopping early",
                engine.no_improvement_counter()
            );
        }

        let summary = RunSummary {
            steps,
            last_step: engine.current_step(),
            best_cost: engine.best_cost(),
            best_features: engine.best_features(),
            stop_reason,
        };
        callback.on_run_complete(&summary);
        Ok(summary)
    }
}

pub type SearchOutcome = (Box<dyn SearchEngine>, RunSummary);

/// A search loop running on its own worker thread.
///
/// The engine moves into the worker and comes back with the summary once
/// the loop ends.
pub struct BackgroundSearch {
    handle: Option<JoinHandle<(Box<dyn SearchEngine>, Result<RunSummary>)>>,
    progress_rx: Receiver<StepProgress>,
    control: RunControl,
}

impl BackgroundSearch {
    pub fn start(engine: Box<dyn SearchEngine>, max_steps: usize) -> Result<Self> {
        let (progress_tx, progress_rx) = channel();
        let control = RunControl::new();
        let runner = SearchRunner::new(max_steps).with_control(control.clone());

        let handle = thread::Builder::new()
            .name("searchmi-search".to_string())
            .spawn(move || {
                let mut engine = engine;
                let mut callback = ChannelProgressCallback::new(progress_tx);
                let result = runner.run(engine.as_mut(), &mut callback);
                (engine, result)
            })?;

        Ok(Self {
            handle: Some(handle),
            progress_rx,
            control,
        })
    }

    /// Next pending progress update, without blocking.
    pub fn poll_progress(&self) -> Option<StepProgress> {
        self.progress_rx.try_recv().ok()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Engine and summary once the worker has finished, `None` while it is
    /// still running or after the results were taken.
    pub fn try_get_results(&mut self) -> Option<Result<SearchOutcome>> {
        match self.handle.take() {
            Some(handle) if handle.is_finished() => Some(Self::join(handle)),
            Some(handle) => {
                self.handle = Some(handle);
                None
            }
            None => None,
        }
    }

    /// Block until the worker finishes.
    pub fn wait(mut self) -> Result<SearchOutcome> {
        match self.handle.take() {
            Some(handle) => Self::join(handle),
            None => Err(SearchmiError::Validation(
                "search results were already taken".to_string(),
            )),
        }
    }

    fn join(handle: JoinHandle<(Box<dyn SearchEngine>, Result<RunSummary>)>) -> Result<SearchOutcome> {
        let (engine, result) = handle
            .join()
            .map_err(|_| SearchmiError::Validation("search thread panicked".to_string()))?;
        result.map(|summary| (engine, summary))
    }
}

impl Drop for BackgroundSearch {
    fn drop(&mut self) {
        self.control.cancel();
        self.control.resume();
    }
}
