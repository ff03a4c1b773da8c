use crate::core::{CorpusError, Result};
use crate::document::DocumentHandle;
use std::collections::HashMap;

/// Session memo of decoded documents keyed by name, plus a loaded flag per
/// collection position.
///
/// There is no size bound and no eviction policy: entries leave only through
/// [`LoadCache::evict`]. The cache never talks to a backend.
#[derive(Debug, Default)]
pub struct LoadCache {
    documents: HashMap<String, DocumentHandle>,
    loaded: Vec<bool>,
}

impl LoadCache {
    /// Create a cache with `slots` unloaded positions.
    pub fn with_slots(slots: usize) -> Self {
        Self {
            documents: HashMap::new(),
            loaded: vec![false; slots],
        }
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.loaded.get(index).copied().unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Result<DocumentHandle> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| CorpusError::NotFound(format!("{} (not cached)", name)))
    }

    /// Cache `document` for `name` and flag `index` loaded. Replaces any
    /// earlier entry for the same name.
    pub fn store(&mut self, index: usize, name: impl Into<String>, document: DocumentHandle) {
        if index >= self.loaded.len() {
            self.loaded.resize(index + 1, false);
        }
        self.documents.insert(name.into(), document);
        self.loaded[index] = true;
    }

    /// Drop a cached entry but keep the slot, so the position reads as unloaded.
    pub fn unload(&mut self, index: usize, name: &str) -> Option<DocumentHandle> {
        if let Some(flag) = self.loaded.get_mut(index) {
            *flag = false;
        }
        self.documents.remove(name)
    }

    /// Remove the entry and its slot; later slots shift down by one.
    pub fn evict(&mut self, index: usize, name: &str) -> Option<DocumentHandle> {
        if index < self.loaded.len() {
            self.loaded.remove(index);
        }
        self.documents.remove(name)
    }

    pub fn loaded_count(&self) -> usize {
        self.documents.len()
    }
}
