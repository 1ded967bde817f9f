use proptest::prelude::*;
use searchmi::config::{AnnealingConfig, ObjectiveConfig};
use searchmi::engines::evaluation::CostFunction;
use searchmi::engines::search::operators::acceptance_probability;
use searchmi::engines::search::{AnnealingEngine, SearchEngine};
use searchmi::{FitnessEvaluator, SearchData, Selection};
use std::sync::Arc;

/// Rugged cost over 10 features: many local minima, no ties with the optimum.
struct Rugged {
    names: Vec<String>,
}

impl Rugged {
    fn new() -> Self {
        Self {
            names: (0..10).map(|i| format!("taxon_{}", i)).collect(),
        }
    }
}

impl CostFunction for Rugged {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn cost(&self, selection: &Selection) -> searchmi::Result<f64> {
        let code: usize = selection
            .bits()
            .iter()
            .enumerate()
            .map(|(i, &b)| (b as usize) << i)
            .sum();
        Ok(((code * 7919) % 1009) as f64 / 1009.0)
    }
}

fn config(temperature: f64, cooling_rate: f64, seed: u64) -> AnnealingConfig {
    AnnealingConfig {
        temperature,
        cooling_rate,
        random_seed: Some(seed),
        stop_strategy: false,
        ..AnnealingConfig::default()
    }
}

#[test]
fn test_temperature_decays_per_accepted_move_only() {
    let mut engine = AnnealingEngine::new(Arc::new(Rugged::new()), config(0.5, 0.9, 8)).unwrap();
    for _ in 0..200 {
        engine.run_one_iteration().unwrap();
    }

    let accepted = engine.accepted_moves();
    assert!(accepted > 0 && accepted < 199, "accepted {}", accepted);
    let expected = 0.5 * 0.9f64.powi(accepted as i32);
    assert!((engine.temperature() - expected).abs() < 1e-12);
}

#[test]
fn test_zero_temperature_is_greedy() {
    let mut engine = AnnealingEngine::new(Arc::new(Rugged::new()), config(0.0, 0.95, 31)).unwrap();
    engine.run_one_iteration().unwrap();
    engine.run_one_iteration().unwrap();

    for _ in 0..100 {
        let accepted_before = engine.accepted_moves();
        let cost_before = engine.current_cost();
        engine.run_one_iteration().unwrap();

        if engine.accepted_moves() > accepted_before {
            assert!(engine.current_cost() < cost_before);
        } else {
            assert_eq!(engine.current_cost(), cost_before);
        }
    }
    assert_eq!(engine.temperature(), 0.0);
}

#[test]
fn test_records_follow_current_solution() {
    let cost = Arc::new(Rugged::new());
    let mut engine = AnnealingEngine::new(cost.clone(), config(0.2, 0.95, 2)).unwrap();
    for step in 0..30 {
        engine.run_one_iteration().unwrap();
        let record = engine.history().get(step).unwrap();
        let current = engine.current_solution().unwrap();
        assert_eq!(record.best_cost, engine.current_cost());
        assert_eq!(record.features, current.feature_names(cost.feature_names()));
        assert!(record.population.is_none());
    }
}

#[test]
fn test_best_cost_is_minimum_of_history() {
    let mut engine = AnnealingEngine::new(Arc::new(Rugged::new()), config(1.0, 0.95, 77)).unwrap();
    for _ in 0..60 {
        engine.run_one_iteration().unwrap();
    }
    let minimum = engine
        .history()
        .iter()
        .map(|r| r.best_cost)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(engine.best_cost(), minimum);
}

#[test]
fn test_finds_separating_species() {
    let features = vec!["F1".to_string(), "F2".to_string(), "F3".to_string()];
    let rows = vec![
        vec![1.0, 1.0, 0.0],
        vec![1.0, 1.0, 1.0],
        vec![1.0, 1.0, 0.0],
        vec![0.0, 1.0, 1.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 1.0, 1.0],
    ];
    let labels = ["case", "case", "case", "control", "control", "control"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let data = Arc::new(SearchData::new(features, rows, labels).unwrap());
    let evaluator = Arc::new(FitnessEvaluator::from_config(data, &ObjectiveConfig::default()).unwrap());

    let mut engine = AnnealingEngine::new(evaluator, config(0.0, 0.95, 42)).unwrap();
    for _ in 0..60 {
        engine.run_one_iteration().unwrap();
    }
    assert!((engine.best_cost() - 0.1).abs() < 1e-12);
    assert!(engine.best_features().contains(&"F1".to_string()));
}

proptest! {
    #[test]
    fn prop_improvements_always_accepted(
        current in 0.0f64..=1.0,
        delta in 1e-9f64..1.0,
        temperature in 0.0f64..1e4,
    ) {
        let candidate = current - delta;
        prop_assert_eq!(acceptance_probability(current, candidate, temperature), 1.0);
    }

    #[test]
    fn prop_worse_moves_stay_below_one(
        current in 0.0f64..=1.0,
        delta in 1e-6f64..1.0,
        temperature in 1e-3f64..1e3,
    ) {
        let p = acceptance_probability(current, current + delta, temperature);
        prop_assert!((0.0..1.0).contains(&p));
    }
}
