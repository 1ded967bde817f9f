use crate::error::Result;
use crate::types::Selection;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Memoised costs keyed by the exact selection vector.
///
/// Entries are never evicted: a cost is a pure function of the selection for
/// the lifetime of a run, and only visited selections are stored. The cache
/// is cleared when the owning engine is reinitialised.
///
/// Concurrent misses on the same key may both compute; the results are
/// identical so the second insert is harmless.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    data: RwLock<HashMap<Selection, f64>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Selection) -> Option<f64> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(key).copied()
    }

    pub fn get_or_compute<F>(&self, key: &Selection, compute: F) -> Result<f64>
    where
        F: FnOnce(&Selection) -> Result<f64>,
    {
        if let Some(cost) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cost);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let cost = compute(key)?;
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.clone(), cost);
        Ok(cost)
    }

    pub fn clear(&self) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
