use super::checkpoint::{finite_or_none, Checkpoint, EngineState, GeneticState};
use super::operators::{self, crossover, mutate, rank_population, split_cohorts};
use super::stop_policy::{Stagnation, StopPolicy};
use super::SearchEngine;
use crate::config::genetic::GeneticConfig;
use crate::config::traits::ConfigSection;
use crate::data::EvaluationCache;
use crate::engines::evaluation::CostFunction;
use crate::error::{Result, SearchmiError};
use crate::types::{EngineKind, Selection, TrackingHistory, TrackingRecord};
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::Arc;

/// Generational genetic search.
///
/// Step 0 evaluates the all-features baseline, step 1 a uniformly random
/// population, and every later step the offspring bred at the step before.
/// Breeding keeps the elite cohort unchanged, crosses the middle cohort
/// at one shared point and flips one bit of every child.
pub struct GeneticEngine {
    config: GeneticConfig,
    cost_fn: Arc<dyn CostFunction>,
    cache: EvaluationCache,
    rng: StdRng,
    step: Option<usize>,
    next_population: Vec<Selection>,
    stagnation: Stagnation,
    best_selection: Option<Selection>,
    history: TrackingHistory,
}

/// Everything a step produces, applied only once the whole step succeeded.
struct StepOutcome {
    record: TrackingRecord,
    best: Selection,
    next_population: Vec<Selection>,
    rng: StdRng,
}

impl GeneticEngine {
    pub fn new(cost_fn: Arc<dyn CostFunction>, config: GeneticConfig) -> Result<Self> {
        config.validate()?;
        if cost_fn.feature_names().is_empty() {
            return Err(SearchmiError::Data(
                "feature universe is empty, nothing to search".to_string(),
            ));
        }

        Ok(Self {
            rng: operators::seeded_rng(config.random_seed),
            config,
            cost_fn,
            cache: EvaluationCache::new(),
            step: None,
            next_population: Vec::new(),
            stagnation: Stagnation::default(),
            best_selection: None,
            history: TrackingHistory::new(),
        })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    fn num_features(&self) -> usize {
        self.cost_fn.feature_names().len()
    }

    /// Costs of every individual, evaluated in parallel through the cache.
    fn evaluate_population(&self, population: &[Selection]) -> Result<Vec<f64>> {
        population
            .par_iter()
            .map(|individual| {
                self.cache
                    .get_or_compute(individual, |s| self.cost_fn.cost(s))
            })
            .collect()
    }

    /// Elites ++ breeding parents ++ mutated offspring, exactly `pop_size` long.
    fn breed(&self, population: &[Selection], costs: &[f64], rng: &mut StdRng) -> Vec<Selection> {
        let ranked = rank_population(population, costs);
        let (elites, parents) =
            split_cohorts(&ranked, self.config.num_parents, self.config.elite_count());

        let mut offspring = crossover(&parents, self.config.offspring_count(), rng);
        mutate(&mut offspring, rng);

        let mut next = elites;
        next.extend(parents);
        next.extend(offspring);
        next
    }

    fn compute_step(&self, index: usize) -> Result<StepOutcome> {
        let mut rng = self.rng.clone();
        let num_features = self.num_features();

        let population = match index {
            0 => vec![Selection::full(num_features)],
            1 => (0..self.config.pop_size)
                .map(|_| operators::random_selection(num_features, &mut rng))
                .collect(),
            _ => self.next_population.clone(),
        };

        let costs = self.evaluate_population(&population)?;

        // First individual holding the minimum cost.
        let (best_index, best_cost) = costs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |(bi, bc), (i, c)| if c < bc { (i, c) } else { (bi, bc) });
        let best = population[best_index].clone();

        let next_population = if index == 0 {
            Vec::new()
        } else {
            self.breed(&population, &costs, &mut rng)
        };

        let record = TrackingRecord {
            index,
            best_cost,
            best_index: Some(best_index),
            features: best.feature_names(self.cost_fn.feature_names()),
            population: Some(population),
        };

        Ok(StepOutcome {
            record,
            best,
            next_population,
            rng,
        })
    }
}

impl SearchEngine for GeneticEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Genetic
    }

    fn run_one_iteration(&mut self) -> Result<()> {
        let index = self.step.map_or(0, |s| s + 1);
        let outcome = self.compute_step(index)?;

        if self.stagnation.observe(outcome.record.best_cost) {
            self.best_selection = Some(outcome.best);
        }

        log::debug!(
            "Generation {}: best {:.6}, global best {:.6}, cache {} entries ({} hits)",
            index,
            outcome.record.best_cost,
            self.stagnation.best_cost,
            self.cache.len(),
            self.cache.hits()
        );

        self.history.push(outcome.record);
        self.next_population = outcome.next_population;
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
        self.next_population.clear();
        self.stagnation = Stagnation::default();
        self.best_selection = None;
        self.history.clear();
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            EngineKind::Genetic,
            self.cost_fn.feature_names().to_vec(),
            EngineState::Genetic(GeneticState {
                step: self.step,
                next_population: self.next_population.clone(),
                best_cost: finite_or_none(self.stagnation.best_cost),
                best_selection: self.best_selection.clone(),
                no_improvement_counter: self.stagnation.no_improvement_counter,
                history: self.history.clone(),
            }),
        )
    }

    fn restore(&mut self, checkpoint: Checkpoint) -> Result<()> {
        checkpoint.ensure_compatible(EngineKind::Genetic, self.cost_fn.feature_names())?;
        let state = match checkpoint.state {
            EngineState::Genetic(state) => state,
            EngineState::Annealing(_) => {
                return Err(SearchmiError::Checkpoint(
                    "checkpoint holds annealing state".to_string(),
                ))
            }
        };

        let num_features = self.num_features();
        if state
            .next_population
            .iter()
            .any(|s| s.len() != num_features)
        {
            return Err(SearchmiError::Checkpoint(
                "checkpoint population does not match the feature universe".to_string(),
            ));
        }
        if state.step.is_some_and(|s| s >= 1) && state.next_population.len() != self.config.pop_size {
            return Err(SearchmiError::Checkpoint(format!(
                "checkpoint population has {} individuals, configured pop_size is {}",
                state.next_population.len(),
                self.config.pop_size
            )));
        }

        self.cache.clear();
        self.rng = operators::resumed_rng(self.config.random_seed, state.step);
        self.step = state.step;
        self.next_population = state.next_population;
        self.stagnation = Stagnation {
            best_cost: state.best_cost.unwrap_or(f64::INFINITY),
            no_improvement_counter: state.no_improvement_counter,
        };
        self.best_selection = state.best_selection;
        self.history = state.history;

        log::info!("Restored genetic search at generation {:?}", self.step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Cost is the fraction of unselected features, plus 1 for the empty set.
    struct CountingCost {
        names: Vec<String>,
        calls: AtomicUsize,
    }

    impl CountingCost {
        fn new(n: usize) -> Self {
            Self {
                names: (0..n).map(|i| format!("F{}", i + 1)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CostFunction for CountingCost {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn cost(&self, selection: &Selection) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = selection.len() as f64;
            Ok(if selection.count_selected() == 0 {
                1.0
            } else {
                selection.count_selected() as f64 / n
            })
        }
    }

    fn small_config() -> GeneticConfig {
        GeneticConfig {
            pop_size: 20,
            num_parents: 10,
            ..GeneticConfig::default()
        }
    }

    #[test]
    fn test_step_zero_is_full_baseline() {
        let cost = Arc::new(CountingCost::new(5));
        let mut engine = GeneticEngine::new(cost, small_config()).unwrap();
        assert_eq!(engine.current_step(), None);
        assert_eq!(engine.best_cost(), f64::INFINITY);

        engine.run_one_iteration().unwrap();
        let record = engine.history().get(0).unwrap();
        assert_eq!(record.population.as_ref().unwrap(), &vec![Selection::full(5)]);
        assert_eq!(record.best_cost, 1.0);
        assert_eq!(engine.current_step(), Some(0));
    }

    #[test]
    fn test_revisited_selections_hit_the_cache() {
        let cost = Arc::new(CountingCost::new(4));
        let mut engine = GeneticEngine::new(cost.clone(), small_config()).unwrap();
        for _ in 0..5 {
            engine.run_one_iteration().unwrap();
        }
        // 1 + 4 * 20 lookups over at most 16 distinct selections.
        let cache = engine.cache();
        assert_eq!(cache.hits() + cache.misses(), 81);
        assert!(cache.len() <= 16);
        assert!(cache.hits() > 0);
        assert_eq!(cost.calls.load(Ordering::SeqCst), cache.misses());
    }

    #[test]
    fn test_reinit_resets_everything() {
        let cost = Arc::new(CountingCost::new(4));
        let mut engine = GeneticEngine::new(cost, small_config()).unwrap();
        engine.run_one_iteration().unwrap();
        engine.run_one_iteration().unwrap();
        let first_run = engine.history().clone();

        engine.reinit();
        assert_eq!(engine.current_step(), None);
        assert!(engine.history().is_empty());
        assert!(engine.cache().is_empty());
        assert_eq!(engine.best_cost(), f64::INFINITY);

        engine.run_one_iteration().unwrap();
        engine.run_one_iteration().unwrap();
        assert_eq!(engine.history(), &first_run);
    }

    #[test]
    fn test_empty_universe_is_rejected() {
        let cost = Arc::new(CountingCost::new(0));
        assert!(matches!(
            GeneticEngine::new(cost, small_config()),
            Err(SearchmiError::Data(_))
        ));
    }
}
