use serde::{Deserialize, Serialize};

/// True when the stop strategy is on and the no-improvement counter has
/// reached the patience exactly.
pub fn should_stop(no_improvement_counter: usize, patience: usize, stop_strategy_enabled: bool) -> bool {
    stop_strategy_enabled && no_improvement_counter == patience
}

/// Stagnation rule read by callers between steps. Engines never enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPolicy {
    pub enabled: bool,
    pub patience: usize,
}

impl StopPolicy {
    pub fn new(enabled: bool, patience: usize) -> Self {
        Self { enabled, patience }
    }

    pub fn should_stop(&self, no_improvement_counter: usize) -> bool {
        should_stop(no_improvement_counter, self.patience, self.enabled)
    }
}

/// Best-so-far tracking shared by both engines: the counter resets on a
/// strictly better cost and increments otherwise.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Stagnation {
    pub best_cost: f64,
    pub no_improvement_counter: usize,
}

impl Default for Stagnation {
    fn default() -> Self {
        Self {
            best_cost: f64::INFINITY,
            no_improvement_counter: 0,
        }
    }
}

impl Stagnation {
    /// Record a step's cost; returns true when it improved the best.
    pub fn observe(&mut self, cost: f64) -> bool {
        if cost < self.best_cost {
            self.best_cost = cost;
            self.no_improvement_counter = 0;
            true
        } else {
            self.no_improvement_counter += 1;
            false
        }
    }
}
