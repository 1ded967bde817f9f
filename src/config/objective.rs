use super::traits::ConfigSection;
use crate::error::SearchmiError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatTest {
    MannWhitneyU,
    WelchT,
    OneWayAnova,
    KruskalWallis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hypothesis {
    TwoSided,
    OneSided,
}

/// Direction of a one-sided signature: positive signatures are richer in
/// the positive group, negative ones poorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub test: StatTest,
    pub hypothesis: Hypothesis,
    pub signature: SignatureType,
    /// Reference group for one-sided two-group tests.
    pub positive_label: Option<String>,
    /// Group categories in comparison order; empty means "use the data's".
    pub categories: Vec<String>,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            test: StatTest::MannWhitneyU,
            hypothesis: Hypothesis::TwoSided,
            signature: SignatureType::Positive,
            positive_label: None,
            categories: Vec::new(),
        }
    }
}

impl ConfigSection for ObjectiveConfig {
    fn section_name() -> &'static str {
        "objective"
    }

    fn validate(&self) -> Result<(), SearchmiError> {
        if self.hypothesis == Hypothesis::OneSided && self.positive_label.is_none() {
            return Err(SearchmiError::Configuration(
                "One-sided hypothesis requires a positive_label".to_string()
            ));
        }
        if self.categories.len() > 3 {
            return Err(SearchmiError::Configuration(format!(
                "At most 3 categories can be compared, got {}",
                self.categories.len()
            )));
        }
        if let Some(label) = &self.positive_label {
            if !self.categories.is_empty() && !self.categories.contains(label) {
                return Err(SearchmiError::Configuration(format!(
                    "positive_label '{}' is not one of the categories {:?}",
                    label, self.categories
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sided_needs_label() {
        let config = ObjectiveConfig {
            hypothesis: Hypothesis::OneSided,
            ..ObjectiveConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ObjectiveConfig {
            hypothesis: Hypothesis::OneSided,
            positive_label: Some("CRC".to_string()),
            ..ObjectiveConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_label_must_be_a_category() {
        let config = ObjectiveConfig {
            positive_label: Some("adenoma".to_string()),
            categories: vec!["CRC".to_string(), "control".to_string()],
            ..ObjectiveConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
