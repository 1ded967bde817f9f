use super::{
    annealing::AnnealingConfig,
    genetic::GeneticConfig,
    objective::ObjectiveConfig,
    run::RunConfig,
    traits::ConfigSection,
};
use crate::error::SearchmiError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix of environment overrides, e.g. `SEARCHMI__GENETIC__POP_SIZE=500`.
pub const ENV_PREFIX: &str = "SEARCHMI";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub objective: ObjectiveConfig,
    pub genetic: GeneticConfig,
    pub annealing: AnnealingConfig,
    pub run: RunConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), SearchmiError> {
        self.objective.validate()?;
        self.genetic.validate()?;
        self.annealing.validate()?;
        self.run.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchmiError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SearchmiError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| SearchmiError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    /// Load `path` and apply `SEARCHMI__<SECTION>__<FIELD>` environment
    /// overrides on top of it.
    pub fn load_layered<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchmiError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SearchmiError::Configuration(format!("Failed to load config: {}", e)))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| SearchmiError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchmiError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| SearchmiError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| SearchmiError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Apply `f` to a copy and keep it only if the result validates.
    pub fn update<F>(&self, f: F) -> Result<(), SearchmiError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        self.replace(candidate)
    }

    fn replace(&self, config: AppConfig) -> Result<(), SearchmiError> {
        config.validate()?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }
}
