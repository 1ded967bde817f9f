pub mod evaluator;
pub mod objective;
pub mod stats;

pub use evaluator::{CostFunction, FitnessEvaluator, EMPTY_SELECTION_COST};
pub use objective::{Objective, ThreeGroupTest, TwoGroupTest};
pub use stats::{Alternative, StatsError};
