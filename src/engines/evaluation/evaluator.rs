use super::objective::Objective;
use crate::config::objective::ObjectiveConfig;
use crate::data::SearchData;
use crate::error::{Result, SearchmiError};
use crate::types::Selection;
use std::sync::Arc;

/// Cost of the empty selection, the worst possible p-value.
pub const EMPTY_SELECTION_COST: f64 = 1.0;

/// A pure cost over selections of a fixed feature universe. Lower is better.
///
/// Implementations must be deterministic and safe to call from several
/// threads at once; the search engines evaluate whole generations in
/// parallel.
pub trait CostFunction: Send + Sync {
    fn feature_names(&self) -> &[String];

    fn cost(&self, selection: &Selection) -> Result<f64>;
}

/// Scores a selection by the p-value of the configured group test on
/// per-sample richness.
pub struct FitnessEvaluator {
    data: Arc<SearchData>,
    objective: Objective,
    /// Group slot of every sample, aligned with the data rows.
    membership: Vec<Option<usize>>,
}

impl FitnessEvaluator {
    pub fn new(data: Arc<SearchData>, objective: Objective) -> Self {
        let membership = data
            .labels()
            .iter()
            .map(|label| objective.group_of(label))
            .collect();

        Self {
            data,
            objective,
            membership,
        }
    }

    /// Resolve the objective from config, taking the categories from the
    /// data when the config does not list them.
    pub fn from_config(data: Arc<SearchData>, config: &ObjectiveConfig) -> Result<Self> {
        let categories = if config.categories.is_empty() {
            data.categories()
        } else {
            config.categories.clone()
        };
        let objective = Objective::resolve(config, &categories)?;
        log::debug!("Resolved objective {:?} over {} features", objective, data.num_features());
        Ok(Self::new(data, objective))
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn data(&self) -> &SearchData {
        &self.data
    }

    /// Richness of every sample, grouped by objective slot.
    fn grouped_richness(&self, selected: &[usize]) -> Vec<Vec<f64>> {
        let mut groups = vec![Vec::new(); self.objective.group_count()];
        for (sample, slot) in self.membership.iter().enumerate() {
            if let Some(slot) = slot {
                groups[*slot].push(self.data.richness(sample, selected) as f64);
            }
        }
        groups
    }

    pub fn evaluate(&self, selection: &Selection) -> Result<f64> {
        if selection.len() != self.data.num_features() {
            return Err(SearchmiError::InvalidSelection(format!(
                "selection has {} bits, feature universe has {}",
                selection.len(),
                self.data.num_features()
            )));
        }

        let selected: Vec<usize> = selection.selected_indices().collect();
        if selected.is_empty() {
            return Ok(EMPTY_SELECTION_COST);
        }

        let groups = self.grouped_richness(&selected);
        Ok(self.objective.p_value(&groups)?)
    }
}

impl CostFunction for FitnessEvaluator {
    fn feature_names(&self) -> &[String] {
        self.data.feature_names()
    }

    fn cost(&self, selection: &Selection) -> Result<f64> {
        self.evaluate(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::objective::StatTest;
    use crate::engines::evaluation::stats::StatsError;

    /// Six samples, three features; F1 separates case from control.
    fn separated_data() -> Arc<SearchData> {
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
        Arc::new(SearchData::new(features, rows, labels).unwrap())
    }

    #[test]
    fn test_empty_selection_costs_one() {
        let evaluator = FitnessEvaluator::from_config(separated_data(), &ObjectiveConfig::default()).unwrap();
        assert_eq!(evaluator.evaluate(&Selection::empty(3)).unwrap(), 1.0);
    }

    #[test]
    fn test_separating_feature_reaches_minimum() {
        let evaluator = FitnessEvaluator::from_config(separated_data(), &ObjectiveConfig::default()).unwrap();
        let f1 = Selection::from_bits(&[1, 0, 0]).unwrap();
        assert!((evaluator.evaluate(&f1).unwrap() - 0.1).abs() < 1e-12);
        let everything = Selection::full(3);
        assert!(evaluator.evaluate(&everything).unwrap() > 0.1);
    }

    #[test]
    fn test_wrong_length_is_contract_violation() {
        let evaluator = FitnessEvaluator::from_config(separated_data(), &ObjectiveConfig::default()).unwrap();
        let err = evaluator.evaluate(&Selection::full(4)).unwrap_err();
        assert!(matches!(err, SearchmiError::InvalidSelection(_)));
    }

    #[test]
    fn test_absent_category_propagates_error() {
        let config = ObjectiveConfig {
            test: StatTest::KruskalWallis,
            categories: vec!["case".to_string(), "control".to_string(), "adenoma".to_string()],
            ..ObjectiveConfig::default()
        };
        let evaluator = FitnessEvaluator::from_config(separated_data(), &config).unwrap();
        let err = evaluator.evaluate(&Selection::full(3)).unwrap_err();
        assert!(matches!(
            err,
            SearchmiError::Statistics(StatsError::EmptyGroup(ref group)) if group == "adenoma"
        ));
        // The empty selection short-circuits before any test runs.
        assert_eq!(evaluator.evaluate(&Selection::empty(3)).unwrap(), 1.0);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let evaluator = FitnessEvaluator::from_config(separated_data(), &ObjectiveConfig::default()).unwrap();
        let selection = Selection::from_bits(&[1, 0, 1]).unwrap();
        let first = evaluator.evaluate(&selection).unwrap();
        let second = evaluator.evaluate(&selection).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }
}
