use proptest::prelude::*;
use searchmi::config::{GeneticConfig, ObjectiveConfig, StatTest};
use searchmi::engines::evaluation::CostFunction;
use searchmi::engines::search::{GeneticEngine, SearchEngine};
use searchmi::{FitnessEvaluator, SearchData, SearchmiError, Selection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Six samples, three features, F1 present in every case sample only.
fn separated_data() -> Arc<SearchData> {
    let features = vec!["F1".to_string(), "F2".to_string(), "F3".to_string()];
    let rows = vec![
        vec![4.0, 1.0, 0.0],
        vec![2.0, 3.0, 1.0],
        vec![7.0, 1.0, 0.0],
        vec![0.0, 2.0, 5.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 9.0, 1.0],
    ];
    let labels = ["case", "case", "case", "control", "control", "control"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Arc::new(SearchData::new(features, rows, labels).unwrap())
}

fn separated_evaluator() -> Arc<FitnessEvaluator> {
    Arc::new(FitnessEvaluator::from_config(separated_data(), &ObjectiveConfig::default()).unwrap())
}

/// Distance to a hidden target signature, scaled into [0, 1].
struct TargetDistance {
    names: Vec<String>,
    target: Vec<bool>,
}

impl TargetDistance {
    fn new(n: usize) -> Self {
        Self {
            names: (0..n).map(|i| format!("species_{:02}", i)).collect(),
            target: (0..n).map(|i| i % 3 == 0).collect(),
        }
    }
}

impl CostFunction for TargetDistance {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn cost(&self, selection: &Selection) -> searchmi::Result<f64> {
        let distance = selection
            .bits()
            .iter()
            .zip(&self.target)
            .filter(|(a, b)| a != b)
            .count();
        Ok(distance as f64 / self.names.len() as f64)
    }
}

/// Fails every evaluation while `failing` is set.
struct SwitchableCost {
    inner: TargetDistance,
    failing: AtomicBool,
}

impl CostFunction for SwitchableCost {
    fn feature_names(&self) -> &[String] {
        self.inner.feature_names()
    }

    fn cost(&self, selection: &Selection) -> searchmi::Result<f64> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SearchmiError::Validation("evaluation refused".to_string()));
        }
        self.inner.cost(selection)
    }
}

fn config(pop_size: usize, num_parents: usize, seed: u64) -> GeneticConfig {
    GeneticConfig {
        pop_size,
        num_parents,
        random_seed: Some(seed),
        ..GeneticConfig::default()
    }
}

#[test]
fn test_separating_feature_found_within_ten_generations() {
    let mut engine = GeneticEngine::new(separated_evaluator(), config(30, 10, 42)).unwrap();

    for _ in 0..=10 {
        engine.run_one_iteration().unwrap();
    }

    // 3 vs 3 fully separated groups: the smallest two-sided Mann-Whitney p-value.
    assert!((engine.best_cost() - 0.1).abs() < 1e-12, "best cost {}", engine.best_cost());
    assert!(engine.best_features().contains(&"F1".to_string()));
    assert!(!engine.best_features().contains(&"F3".to_string()));
}

#[test]
fn test_best_cost_never_increases() {
    let mut engine = GeneticEngine::new(Arc::new(TargetDistance::new(24)), config(40, 20, 3)).unwrap();
    let mut previous = f64::INFINITY;
    for _ in 0..15 {
        engine.run_one_iteration().unwrap();
        assert!(engine.best_cost() <= previous);
        previous = engine.best_cost();
    }
}

#[test]
fn test_population_size_is_constant_from_step_one() {
    let mut engine = GeneticEngine::new(Arc::new(TargetDistance::new(12)), config(37, 11, 9)).unwrap();
    for _ in 0..8 {
        engine.run_one_iteration().unwrap();
    }

    let history = engine.history();
    assert_eq!(history.get(0).unwrap().population.as_ref().unwrap().len(), 1);
    for step in 1..8 {
        let population = history.get(step).unwrap().population.as_ref().unwrap();
        assert_eq!(population.len(), 37, "generation {}", step);
        assert!(population.iter().all(|s| s.len() == 12));
    }
}

#[test]
fn test_best_individual_survives_as_elite() {
    // floor(25 * 0.04) = 1 elite per generation.
    let mut engine = GeneticEngine::new(Arc::new(TargetDistance::new(30)), config(60, 25, 17)).unwrap();
    assert_eq!(engine.config().elite_count(), 1);

    for _ in 0..10 {
        engine.run_one_iteration().unwrap();
    }

    let history = engine.history();
    for step in 1..9 {
        let current = history.get(step).unwrap();
        let best = &current.population.as_ref().unwrap()[current.best_index.unwrap()];
        let next = history.get(step + 1).unwrap().population.as_ref().unwrap();
        assert_eq!(&next[0], best, "generation {} best was not carried over", step);
    }
}

#[test]
fn test_history_records_best_of_each_generation() {
    let evaluator = separated_evaluator();
    let mut engine = GeneticEngine::new(evaluator.clone(), config(20, 8, 5)).unwrap();
    for _ in 0..4 {
        engine.run_one_iteration().unwrap();
    }

    for record in engine.history().iter() {
        let population = record.population.as_ref().unwrap();
        let best = &population[record.best_index.unwrap()];
        assert_eq!(record.best_cost, evaluator.evaluate(best).unwrap());
        assert_eq!(record.features, best.feature_names(evaluator.feature_names()));
        for individual in population {
            assert!(evaluator.evaluate(individual).unwrap() >= record.best_cost);
        }
    }
}

#[test]
fn test_failed_step_leaves_engine_unchanged() {
    let cost = Arc::new(SwitchableCost {
        inner: TargetDistance::new(10),
        failing: AtomicBool::new(false),
    });
    let mut engine = GeneticEngine::new(cost.clone(), config(16, 6, 21)).unwrap();
    engine.run_one_iteration().unwrap();
    engine.run_one_iteration().unwrap();
    let before = engine.checkpoint();

    cost.failing.store(true, Ordering::SeqCst);
    engine.cache().clear();
    assert!(engine.run_one_iteration().is_err());

    let after = engine.checkpoint();
    assert_eq!(after.state, before.state);
    assert_eq!(engine.current_step(), Some(1));

    cost.failing.store(false, Ordering::SeqCst);
    engine.run_one_iteration().unwrap();
    assert_eq!(engine.current_step(), Some(2));
}

#[test]
fn test_missing_category_error_reaches_caller() {
    let objective = ObjectiveConfig {
        test: StatTest::OneWayAnova,
        categories: vec!["case".to_string(), "control".to_string(), "adenoma".to_string()],
        ..ObjectiveConfig::default()
    };
    let evaluator = Arc::new(FitnessEvaluator::from_config(separated_data(), &objective).unwrap());
    let mut engine = GeneticEngine::new(evaluator, config(10, 4, 1)).unwrap();

    let err = engine.run_one_iteration().unwrap_err();
    assert!(matches!(err, SearchmiError::Statistics(_)));
    assert_eq!(engine.current_step(), None);
    assert!(engine.history().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_same_seed_same_run(seed in any::<u64>(), n in 2usize..16) {
        let run = |seed: u64| {
            let mut engine = GeneticEngine::new(Arc::new(TargetDistance::new(n)), config(12, 5, seed)).unwrap();
            for _ in 0..4 {
                engine.run_one_iteration().unwrap();
            }
            engine.history().clone()
        };
        prop_assert_eq!(run(seed), run(seed));
    }

    #[test]
    fn prop_counter_resets_only_on_strict_improvement(seed in any::<u64>()) {
        let mut engine = GeneticEngine::new(Arc::new(TargetDistance::new(9)), config(10, 4, seed)).unwrap();
        let mut best = f64::INFINITY;
        let mut counter = 0usize;
        for _ in 0..8 {
            engine.run_one_iteration().unwrap();
            let step_cost = engine.history().latest().unwrap().best_cost;
            if step_cost < best {
                best = step_cost;
                counter = 0;
            } else {
                counter += 1;
            }
            prop_assert_eq!(engine.best_cost(), best);
            prop_assert_eq!(engine.no_improvement_counter(), counter);
        }
    }
}
