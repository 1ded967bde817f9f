use super::traits::{validate_patience, ConfigSection};
use crate::error::SearchmiError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    pub num_iterations: usize,
    pub temperature: f64,
    /// Multiplier applied to the temperature after every accepted move.
    pub cooling_rate: f64,
    pub stop_strategy: bool,
    pub improvement_patience: usize,
    pub random_seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            num_iterations: 1000,
            temperature: 100.0,
            cooling_rate: 0.95,
            stop_strategy: true,
            improvement_patience: 10,
            random_seed: Some(42),
        }
    }
}

impl ConfigSection for AnnealingConfig {
    fn section_name() -> &'static str {
        "annealing"
    }

    fn validate(&self) -> Result<(), SearchmiError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(SearchmiError::Configuration(
                "Temperature must be a finite, non-negative number".to_string()
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(SearchmiError::Configuration(
                "Cooling rate must be in (0, 1]".to_string()
            ));
        }
        validate_patience(Self::section_name(), self.stop_strategy, self.improvement_patience)
    }
}
