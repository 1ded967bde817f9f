use super::checkpoint::{finite_or_none, AnnealingState, Checkpoint, EngineState};
use super::operators::{self, acceptance_probability};
use super::stop_policy::{Stagnation, StopPolicy};
use super::SearchEngine;
use crate::config::annealing::AnnealingConfig;
use crate::config::traits::ConfigSection;
use crate::data::EvaluationCache;
use crate::engines::evaluation::CostFunction;
use crate::error::{Result, SearchmiError};
use crate::types::{EngineKind, Selection, TrackingHistory, TrackingRecord};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

/// Single-solution simulated annealing over one-bit neighbourhoods.
///
/// The temperature is multiplied by the cooling rate on every accepted move
/// and left alone on rejections, so after any number of steps it equals
/// `initial * cooling_rate^accepted_moves`.
pub struct AnnealingEngine {
    config: AnnealingConfig,
    cost_fn: Arc<dyn CostFunction>,
    cache: EvaluationCache,
    rng: StdRng,
    step: Option<usize>,
    current: Option<Selection>,
    current_cost: f64,
    temperature: f64,
    accepted_moves: usize,
    stagnation: Stagnation,
    best_selection: Option<Selection>,
    history: TrackingHistory,
}

struct StepOutcome {
    current: Selection,
    current_cost: f64,
    accepted: bool,
    rng: StdRng,
}

impl AnnealingEngine {
    pub fn new(cost_fn: Arc<dyn CostFunction>, config: AnnealingConfig) -> Result<Self> {
        config.validate()?;
        if cost_fn.feature_names().is_empty() {
            return Err(SearchmiError::Data(
                "feature universe is empty, nothing to search".to_string(),
            ));
        }

        Ok(Self {
            rng: operators::seeded_rng(config.random_seed),
            temperature: config.temperature,
            config,
            cost_fn,
            cache: EvaluationCache::new(),
            step: None,
            current: None,
            current_cost: f64::INFINITY,
            accepted_moves: 0,
            stagnation: Stagnation::default(),
            best_selection: None,
            history: TrackingHistory::new(),
        })
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn accepted_moves(&self) -> usize {
        self.accepted_moves
    }

    pub fn current_solution(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    pub fn current_cost(&self) -> f64 {
        self.current_cost
    }

    fn evaluate(&self, selection: &Selection) -> Result<f64> {
        self.cache
            .get_or_compute(selection, |s| self.cost_fn.cost(s))
    }

    fn compute_step(&self, index: usize) -> Result<StepOutcome> {
        let mut rng = self.rng.clone();
        let num_features = self.cost_fn.feature_names().len();

        let current = match index {
            0 => Selection::full(num_features),
            1 => operators::random_selection(num_features, &mut rng),
            _ => self.current.clone().ok_or_else(|| {
                SearchmiError::Validation(format!("iteration {} has no current solution", index))
            })?,
        };
        let current_cost = self.evaluate(&current)?;

        // The baseline step only scores the starting point.
        if index == 0 {
            return Ok(StepOutcome {
                current,
                current_cost,
                accepted: false,
                rng,
            });
        }

        let candidate = operators::neighbour(&current, &mut rng);
        let candidate_cost = self.evaluate(&candidate)?;

        let accepted = if candidate_cost < current_cost {
            true
        } else {
            acceptance_probability(current_cost, candidate_cost, self.temperature) > rng.gen::<f64>()
        };

        log::trace!(
            "Iteration {}: current {:.6}, candidate {:.6}, T={:.6}, accepted={}",
            index,
            current_cost,
            candidate_cost,
            self.temperature,
            accepted
        );

        Ok(if accepted {
            StepOutcome {
                current: candidate,
                current_cost: candidate_cost,
                accepted,
                rng,
            }
        } else {
            StepOutcome {
                current,
                current_cost,
                accepted,
                rng,
            }
        })
    }
}

impl SearchEngine for AnnealingEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Annealing
    }

    fn run_one_iteration(&mut self) -> Result<()> {
        let index = self.step.map_or(0, |s| s + 1);
        let outcome = self.compute_step(index)?;

        if outcome.accepted {
            self.temperature *= self.config.cooling_rate;
            self.accepted_moves += 1;
        }

        self.history.push(TrackingRecord {
            index,
            best_cost: outcome.current_cost,
            best_index: None,
            features: outcome.current.feature_names(self.cost_fn.feature_names()),
            population: None,
        });

        if self.stagnation.observe(outcome.current_cost) {
            self.best_selection = Some(outcome.current.clone());
        }

        log::debug!(
            "Iteration {}: current {:.6}, global best {:.6}, T={:.4}, cache {} entries",
            index,
            outcome.current_cost,
            self.stagnation.best_cost,
            self.temperature,
            self.cache.len()
        );

        self.current = Some(outcome.current);
        self.current_cost = outcome.current_cost;
        self.rng = outcome.rng;
        self.step = Some(index);
        Ok(())
    }

    fn current_step(&self) -> Option<usize> {
        self.step
    }

    fn best_cost(&self) -> f64 {
        self.stagnation.best_cost
    }

    fn best_selection(&self) -> Option<&Selection> {
        self.best_selection.as_ref()
    }

    fn feature_names(&self) -> &[String] {
        self.cost_fn.feature_names()
    }

    fn history(&self) -> &TrackingHistory {
        &self.history
    }

    fn no_improvement_counter(&self) -> usize {
        self.stagnation.no_improvement_counter
    }

    fn stop_policy(&self) -> StopPolicy {
        StopPolicy::new(self.config.stop_strategy, self.config.improvement_patience)
    }

    fn reinit(&mut self) {
        self.cache.clear();
        self.rng = operators::seeded_rng(self.config.random_seed);
        self.step = None;
        self.current = None;
        self.current_cost = f64::INFINITY;
        self.temperature = self.config.temperature;
        self.accepted_moves = 0;
        self.stagnation = Stagnation::default();
        self.best_selection = None;
        self.history.clear();
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            EngineKind::Annealing,
            self.cost_fn.feature_names().to_vec(),
            EngineState::Annealing(AnnealingState {
                step: self.step,
                current: self.current.clone(),
                current_cost: finite_or_none(self.current_cost),
                temperature: self.temperature,
                accepted_moves: self.accepted_moves,
                best_cost: finite_or_none(self.stagnation.best_cost),
                best_selection: self.best_selection.clone(),
                no_improvement_counter: self.stagnation.no_improvement_counter,
                history: self.history.clone(),
            }),
        )
    }

    fn restore(&mut self, checkpoint: Checkpoint) -> Result<()> {
        checkpoint.ensure_compatible(EngineKind::Annealing, self.cost_fn.feature_names())?;
        let state = match checkpoint.state {
            EngineState::Annealing(state) => state,
            EngineState::Genetic(_) => {
                return Err(SearchmiError::Checkpoint(
                    "checkpoint holds genetic state".to_string(),
                ))
            }
        };

        if state.step.is_some() && state.current.is_none() {
            return Err(SearchmiError::Checkpoint(
                "checkpoint of a started run has no current solution".to_string(),
            ));
        }
        if !state.temperature.is_finite() || state.temperature < 0.0 {
            return Err(SearchmiError::Checkpoint(format!(
                "checkpoint temperature {} is not a valid temperature",
                state.temperature
            )));
        }

        self.cache.clear();
        self.rng = operators::resumed_rng(self.config.random_seed, state.step);
        self.step = state.step;
        self.current = state.current;
        self.current_cost = state.current_cost.unwrap_or(f64::INFINITY);
        self.temperature = state.temperature;
        self.accepted_moves = state.accepted_moves;
        self.stagnation = Stagnation {
            best_cost: state.best_cost.unwrap_or(f64::INFINITY),
            no_improvement_counter: state.no_improvement_counter,
        };
        self.best_selection = state.best_selection;
        self.history = state.history;

        log::info!("Restored annealing search at iteration {:?}", self.step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SelectedFraction(Vec<String>);

    impl CostFunction for SelectedFraction {
        fn feature_names(&self) -> &[String] {
            &self.0
        }

        fn cost(&self, selection: &Selection) -> Result<f64> {
            Ok(selection.count_selected() as f64 / selection.len() as f64)
        }
    }

    fn engine(config: AnnealingConfig) -> AnnealingEngine {
        let names = (0..6).map(|i| format!("F{}", i)).collect();
        AnnealingEngine::new(Arc::new(SelectedFraction(names)), config).unwrap()
    }

    #[test]
    fn test_step_zero_scores_baseline_only() {
        let mut engine = engine(AnnealingConfig::default());
        engine.run_one_iteration().unwrap();
        assert_eq!(engine.current_solution(), Some(&Selection::full(6)));
        assert_eq!(engine.current_cost(), 1.0);
        assert_eq!(engine.accepted_moves(), 0);
        assert_eq!(engine.history().get(0).unwrap().features.len(), 6);
    }

    #[test]
    fn test_temperature_tracks_accepted_moves() {
        let config = AnnealingConfig {
            temperature: 50.0,
            cooling_rate: 0.8,
            ..AnnealingConfig::default()
        };
        let mut engine = engine(config);
        for _ in 0..40 {
            engine.run_one_iteration().unwrap();
        }
        let expected = 50.0 * 0.8f64.powi(engine.accepted_moves() as i32);
        assert!((engine.temperature() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reinit_restores_initial_temperature() {
        let mut engine = engine(AnnealingConfig::default());
        for _ in 0..10 {
            engine.run_one_iteration().unwrap();
        }
        engine.reinit();
        assert_eq!(engine.temperature(), 100.0);
        assert_eq!(engine.current_step(), None);
        assert!(engine.current_solution().is_none());
        assert!(engine.cache().is_empty());
    }
}
