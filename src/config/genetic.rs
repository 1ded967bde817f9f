use super::traits::{validate_patience, ConfigSection};
use crate::error::SearchmiError;
use serde::{Deserialize, Serialize};

/// Share of the breeding cohort carried over unchanged as elites.
pub const DEFAULT_ELITE_FRACTION: f64 = 0.04;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub pop_size: usize,
    /// Top-ranked individuals kept each generation (elites plus breeders).
    pub num_parents: usize,
    pub elite_fraction: f64,
    pub num_generations: usize,
    pub stop_strategy: bool,
    pub improvement_patience: usize,
    pub random_seed: Option<u64>,
}

impl GeneticConfig {
    /// `floor(num_parents * elite_fraction)`
    pub fn elite_count(&self) -> usize {
        (self.num_parents as f64 * self.elite_fraction).floor() as usize
    }

    pub fn offspring_count(&self) -> usize {
        self.pop_size.saturating_sub(self.num_parents)
    }
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            pop_size: 300,
            num_parents: 50,
            elite_fraction: DEFAULT_ELITE_FRACTION,
            num_generations: 125,
            stop_strategy: true,
            improvement_patience: 10,
            random_seed: Some(42),
        }
    }
}

impl ConfigSection for GeneticConfig {
    fn section_name() -> &'static str {
        "genetic"
    }

    fn validate(&self) -> Result<(), SearchmiError> {
        if self.pop_size < 2 {
            return Err(SearchmiError::Configuration(
                "Population size must be at least 2".to_string()
            ));
        }
        if self.num_parents == 0 || self.num_parents > self.pop_size {
            return Err(SearchmiError::Configuration(format!(
                "Number of parents must be between 1 and the population size ({}), got {}",
                self.pop_size, self.num_parents
            )));
        }
        if !(0.0..1.0).contains(&self.elite_fraction) {
            return Err(SearchmiError::Configuration(
                "Elite fraction must be in [0, 1)".to_string()
            ));
        }
        validate_patience(Self::section_name(), self.stop_strategy, self.improvement_patience)
    }
}
