pub mod traits;
pub mod objective;
pub mod genetic;
pub mod annealing;
pub mod run;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use objective::{Hypothesis, ObjectiveConfig, SignatureType, StatTest};
pub use genetic::GeneticConfig;
pub use annealing::AnnealingConfig;
pub use run::RunConfig;
pub use traits::ConfigSection;
