pub mod format;
pub mod marker;

pub use format::DocumentFormat;
pub use marker::OwnershipMarker;

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Shared handle to a materialized document.
///
/// The collection keeps one handle per loaded name and hands out clones of it,
/// so two `get` calls for the same index return pointer-equal handles.
pub type DocumentHandle = Arc<RwLock<Document>>;

/// In-memory document: a unique name, text content and a feature map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    content: String,
    features: BTreeMap<String, String>,
    owner: Option<OwnershipMarker>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            features: BTreeMap::new(),
            owner: None,
        }
    }

    /// Builder-style feature setter
    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.features
    }

    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features.get(key).map(String::as_str)
    }

    pub fn owner(&self) -> Option<&OwnershipMarker> {
        self.owner.as_ref()
    }

    pub(crate) fn adopt(&mut self, marker: &OwnershipMarker) {
        self.owner = Some(marker.clone());
    }

    pub(crate) fn release(&mut self) {
        self.owner = None;
    }

    /// Wrap into a shareable handle.
    pub fn into_handle(self) -> DocumentHandle {
        Arc::new(RwLock::new(self))
    }
}
