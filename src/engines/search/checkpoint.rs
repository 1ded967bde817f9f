use super::SearchEngine;
use crate::error::{Result, SearchmiError};
use crate::types::{EngineKind, Selection, TrackingHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Persisted state of a genetic run between two steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticState {
    pub step: Option<usize>,
    /// Population the next step will evaluate (empty until step 1 has run).
    pub next_population: Vec<Selection>,
    /// `None` until a step has completed; JSON has no infinity.
    pub best_cost: Option<f64>,
    pub best_selection: Option<Selection>,
    pub no_improvement_counter: usize,
    pub history: TrackingHistory,
}

/// Persisted state of an annealing run between two steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealingState {
    pub step: Option<usize>,
    pub current: Option<Selection>,
    pub current_cost: Option<f64>,
    pub temperature: f64,
    pub accepted_moves: usize,
    pub best_cost: Option<f64>,
    pub best_selection: Option<Selection>,
    pub no_improvement_counter: usize,
    pub history: TrackingHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum EngineState {
    Genetic(GeneticState),
    Annealing(AnnealingState),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub saved_at: DateTime<Utc>,
    pub kind: EngineKind,
    pub feature_names: Vec<String>,
    pub state: EngineState,
}

impl Checkpoint {
    pub fn new(kind: EngineKind, feature_names: Vec<String>, state: EngineState) -> Self {
        Self {
            saved_at: Utc::now(),
            kind,
            feature_names,
            state,
        }
    }

    /// Step the checkpointed run had completed.
    pub fn step(&self) -> Option<usize> {
        match &self.state {
            EngineState::Genetic(state) => state.step,
            EngineState::Annealing(state) => state.step,
        }
    }

    /// Reject a checkpoint taken by another engine or over another
    /// feature universe.
    pub fn ensure_compatible(&self, kind: EngineKind, feature_names: &[String]) -> Result<()> {
        if self.kind != kind {
            return Err(SearchmiError::Checkpoint(format!(
                "checkpoint was written by the {:?} engine, cannot restore into {:?}",
                self.kind, kind
            )));
        }
        if self.feature_names != feature_names {
            return Err(SearchmiError::Checkpoint(format!(
                "checkpoint covers {} features that do not match the current {} features",
                self.feature_names.len(),
                feature_names.len()
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("Checkpoint saved to {}", path.display());
        Ok(())
    }

    /// Read a checkpoint; a missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

pub fn save_checkpoint(engine: &dyn SearchEngine, path: &Path) -> Result<()> {
    engine.checkpoint().save(path)
}

pub fn load_checkpoint(path: &Path) -> Result<Option<Checkpoint>> {
    Checkpoint::load(path)
}

/// Infinity stands for "no best yet" in memory and `None` on disk.
pub(crate) fn finite_or_none(cost: f64) -> Option<f64> {
    cost.is_finite().then_some(cost)
}
