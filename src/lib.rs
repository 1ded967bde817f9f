pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod export;
pub mod types;

pub use config::{AppConfig, ConfigManager};
pub use data::SearchData;
pub use engines::evaluation::{CostFunction, FitnessEvaluator};
pub use engines::search::{AnnealingEngine, GeneticEngine, SearchEngine, SearchRunner};
pub use error::{Result, SearchmiError};
pub use types::{EngineKind, Selection, TrackingHistory, TrackingRecord};
