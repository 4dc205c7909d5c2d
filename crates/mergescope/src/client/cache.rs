//! # Per-Model Cache
//!
//! An explicit, instance-owned cache for per-model documents,
//! such as token embeddings.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::MSHashMap;

/// Thread-safe cache of shared values keyed by model id.
pub struct ModelCache<V> {
    entries: RwLock<MSHashMap<String, Arc<V>>>,
}

impl<V> Default for ModelCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(MSHashMap::default()),
        }
    }
}

impl<V> ModelCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of cached models.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Look up a cached value.
    pub fn get(
        &self,
        model_id: &str,
    ) -> Option<Arc<V>> {
        self.entries.read().get(model_id).cloned()
    }

    /// Insert a value, replacing any previous entry.
    pub fn insert(
        &self,
        model_id: impl Into<String>,
        value: V,
    ) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.write().insert(model_id.into(), value.clone());
        value
    }

    /// Look up a cached value; or load, cache, and return it.
    ///
    /// `load` runs without holding the lock; if two callers race,
    /// the first insert wins and both receive the same value.
    ///
    /// ## Returns
    /// The cached value; or the error from `load`, leaving the cache unchanged.
    pub fn get_or_try_insert_with<F, E>(
        &self,
        model_id: &str,
        load: F,
    ) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(model_id) {
            return Ok(value);
        }

        log::debug!("model cache miss: {model_id}");
        let value = Arc::new(load()?);
        Ok(self
            .entries
            .write()
            .entry(model_id.to_string())
            .or_insert(value)
            .clone())
    }

    /// Remove a cached value.
    pub fn invalidate(
        &self,
        model_id: &str,
    ) -> Option<Arc<V>> {
        self.entries.write().remove(model_id)
    }

    /// Remove every cached value.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
