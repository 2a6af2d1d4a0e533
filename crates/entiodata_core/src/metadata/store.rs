//! Build-once metadata cache.

use super::model::MetadataModel;
use crate::error::CoreResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the current [`MetadataModel`], built lazily and dropped whenever
/// registrations change.
///
/// Once built, the model is shared as an `Arc` and never mutated; readers
/// holding an older model keep a consistent view after invalidation.
#[derive(Debug, Default)]
pub struct MetadataStore {
    cached: RwLock<Option<Arc<MetadataModel>>>,
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached model, if built.
    pub fn get(&self) -> Option<Arc<MetadataModel>> {
        self.cached.read().clone()
    }

    /// Returns the cached model, building it with `build` if absent.
    ///
    /// Concurrent callers agree on one model: only the first caller to take
    /// the write lock runs `build`.
    pub fn get_or_build(
        &self,
        build: impl FnOnce() -> CoreResult<MetadataModel>,
    ) -> CoreResult<Arc<MetadataModel>> {
        if let Some(model) = self.get() {
            return Ok(model);
        }

        let mut cached = self.cached.write();
        if let Some(model) = cached.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(build()?);
        *cached = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Rebuilds the model unconditionally.
    ///
    /// On failure the previously cached model, if any, stays in place.
    pub fn build(
        &self,
        build: impl FnOnce() -> CoreResult<MetadataModel>,
    ) -> CoreResult<Arc<MetadataModel>> {
        let mut cached = self.cached.write();
        let model = Arc::new(build()?);
        *cached = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Drops the cached model; the next access rebuilds it.
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    /// Whether a model is currently cached.
    pub fn is_built(&self) -> bool {
        self.cached.read().is_some()
    }
}
