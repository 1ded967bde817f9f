use super::traits::ConfigSection;
use crate::error::SearchmiError;
use crate::types::EngineKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings consumed by the command-line driver only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub algorithm: EngineKind,
    pub group_column: String,
    pub index_column: Option<String>,
    pub export_path: Option<PathBuf>,
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            algorithm: EngineKind::Genetic,
            group_column: "study_condition".to_string(),
            index_column: None,
            export_path: None,
            checkpoint_path: None,
        }
    }
}

impl ConfigSection for RunConfig {
    fn section_name() -> &'static str {
        "run"
    }

    fn validate(&self) -> Result<(), SearchmiError> {
        if self.group_column.trim().is_empty() {
            return Err(SearchmiError::Configuration(
                "group_column must not be empty".to_string()
            ));
        }
        if self.index_column.as_deref() == Some(self.group_column.as_str()) {
            return Err(SearchmiError::Configuration(
                "index_column and group_column must differ".to_string()
            ));
        }
        Ok(())
    }
}
