use crate::error::SearchmiError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), SearchmiError>;
}

/// Shared check for the stop-strategy pair carried by both engine sections.
pub(crate) fn validate_patience(
    section: &str,
    stop_strategy: bool,
    improvement_patience: usize,
) -> Result<(), SearchmiError> {
    if stop_strategy && improvement_patience == 0 {
        return Err(SearchmiError::Configuration(format!(
            "{}: improvement_patience must be at least 1 when stop_strategy is enabled",
            section
        )));
    }
    Ok(())
}
