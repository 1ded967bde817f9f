pub mod annealing;
pub mod checkpoint;
pub mod genetic;
pub mod operators;
pub mod progress;
pub mod runner;
pub mod stop_policy;

pub use annealing::AnnealingEngine;
pub use checkpoint::{load_checkpoint, save_checkpoint, Checkpoint, EngineState};
pub use genetic::GeneticEngine;
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, StepProgress};
pub use runner::{BackgroundSearch, RunControl, RunSummary, SearchRunner, StopReason};
pub use stop_policy::{should_stop, StopPolicy};

use crate::config::AppConfig;
use crate::engines::evaluation::CostFunction;
use crate::error::Result;
use crate::types::{EngineKind, Selection, TrackingHistory};
use std::sync::Arc;

/// A caller-paced metaheuristic search over feature selections.
///
/// Each call to [`run_one_iteration`](SearchEngine::run_one_iteration)
/// advances exactly one generation or iteration. The engine never stops on
/// its own: callers read [`should_stop`](SearchEngine::should_stop) and
/// their own step limit between calls.
pub trait SearchEngine: Send {
    fn kind(&self) -> EngineKind;

    /// Advance one step. On error the engine is left exactly as it was.
    fn run_one_iteration(&mut self) -> Result<()>;

    /// Index of the last completed step, `None` before step 0.
    fn current_step(&self) -> Option<usize>;

    /// Lowest cost seen so far, infinity before step 0.
    fn best_cost(&self) -> f64;

    fn best_selection(&self) -> Option<&Selection>;

    fn feature_names(&self) -> &[String];

    fn best_features(&self) -> Vec<String> {
        self.best_selection()
            .map(|s| s.feature_names(self.feature_names()))
            .unwrap_or_default()
    }

    fn history(&self) -> &TrackingHistory;

    fn no_improvement_counter(&self) -> usize;

    fn stop_policy(&self) -> StopPolicy;

    fn should_stop(&self) -> bool {
        self.stop_policy().should_stop(self.no_improvement_counter())
    }

    /// Drop all run state, history and cached costs, and reseed.
    fn reinit(&mut self);

    fn checkpoint(&self) -> Checkpoint;

    fn restore(&mut self, checkpoint: Checkpoint) -> Result<()>;
}

/// Engine of the requested kind over `cost_fn`, configured from `config`.
pub fn build_engine(
    kind: EngineKind,
    cost_fn: Arc<dyn CostFunction>,
    config: &AppConfig,
) -> Result<Box<dyn SearchEngine>> {
    let engine: Box<dyn SearchEngine> = match kind {
        EngineKind::Genetic => Box::new(GeneticEngine::new(cost_fn, config.genetic.clone())?),
        EngineKind::Annealing => Box::new(AnnealingEngine::new(cost_fn, config.annealing.clone())?),
    };
    Ok(engine)
}

/// Configured number of generations or iterations for `kind`.
pub fn max_steps(kind: EngineKind, config: &AppConfig) -> usize {
    match kind {
        EngineKind::Genetic => config.genetic.num_generations,
        EngineKind::Annealing => config.annealing.num_iterations,
    }
}
