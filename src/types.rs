use crate::error::{Result, SearchmiError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Binary feature-selection vector, one bit per feature of the universe.
///
/// The exact bit pattern is the evaluation cache key, so two selections are
/// equal only when every position matches. Operators always work on copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection(Vec<bool>);

impl Selection {
    /// Every feature selected (the "everything" baseline).
    pub fn full(len: usize) -> Self {
        Self(vec![true; len])
    }

    pub fn empty(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn from_bools(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    /// Build from 0/1 integers; any other value is a contract violation.
    pub fn from_bits(bits: &[u8]) -> Result<Self> {
        bits.iter()
            .enumerate()
            .map(|(i, &bit)| match bit {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(SearchmiError::InvalidSelection(format!(
                    "bit {} has value {}, expected 0 or 1",
                    i, other
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn to_bits(&self) -> Vec<u8> {
        self.0.iter().map(|&b| b as u8).collect()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Number of active features.
    pub fn count_selected(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| if b { Some(i) } else { None })
    }

    /// Copy of `self` with bit `index` inverted.
    pub fn with_flipped(&self, index: usize) -> Self {
        let mut bits = self.0.clone();
        if let Some(bit) = bits.get_mut(index) {
            *bit = !*bit;
        }
        Self(bits)
    }

    pub(crate) fn flip(&mut self, index: usize) {
        if let Some(bit) = self.0.get_mut(index) {
            *bit = !*bit;
        }
    }

    /// Names of the selected features, in universe order.
    pub fn feature_names(&self, universe: &[String]) -> Vec<String> {
        self.selected_indices()
            .filter_map(|i| universe.get(i).cloned())
            .collect()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Which metaheuristic produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineKind {
    Genetic,
    Annealing,
}

impl EngineKind {
    /// Label for one step of this engine ("Generation" / "Iteration").
    pub fn step_label(&self) -> &'static str {
        match self {
            Self::Genetic => "Generation",
            Self::Annealing => "Iteration",
        }
    }
}

/// Snapshot of one generation (GA) or iteration (SA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub index: usize,
    /// Best cost of the step (GA) or the current solution's cost (SA).
    pub best_cost: f64,
    /// Position of the best individual inside `population` (GA only).
    pub best_index: Option<usize>,
    pub features: Vec<String>,
    pub population: Option<Vec<Selection>>,
}

/// Append-only step history keyed by step index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingHistory {
    records: BTreeMap<usize, TrackingRecord>,
}

impl TrackingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: TrackingRecord) {
        self.records.insert(record.index, record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, index: usize) -> Option<&TrackingRecord> {
        self.records.get(&index)
    }

    pub fn latest(&self) -> Option<&TrackingRecord> {
        self.records.values().next_back()
    }

    /// Records in ascending step order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrackingRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_rejects_non_binary() {
        assert!(Selection::from_bits(&[0, 1, 1]).is_ok());
        let err = Selection::from_bits(&[0, 2, 1]).unwrap_err();
        assert!(matches!(err, SearchmiError::InvalidSelection(_)));
    }

    #[test]
    fn test_feature_names_follow_universe_order() {
        let universe = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let selection = Selection::from_bits(&[1, 0, 1]).unwrap();
        assert_eq!(selection.feature_names(&universe), vec!["a", "c"]);
        assert_eq!(selection.count_selected(), 2);
        assert_eq!(selection.to_string(), "101");
    }

    #[test]
    fn test_with_flipped_leaves_original_untouched() {
        let original = Selection::full(4);
        let flipped = original.with_flipped(2);
        assert_eq!(original.count_selected(), 4);
        assert_eq!(flipped.to_bits(), vec![1, 1, 0, 1]);
    }

    #[test]
    fn test_history_latest_is_highest_index() {
        let mut history = TrackingHistory::new();
        for index in 0..3 {
            history.push(TrackingRecord {
                index,
                best_cost: 1.0 / (index as f64 + 1.0),
                best_index: None,
                features: vec![],
                population: None,
            });
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().map(|r| r.index), Some(2));
    }
}
