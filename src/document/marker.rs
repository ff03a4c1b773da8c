use std::fmt;
use uuid::Uuid;

/// Tag attached to every document a collection has materialized.
///
/// Carries no behaviour. A collection compares markers to tell its own
/// documents apart from free-standing ones and from documents loaded by
/// another collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipMarker {
    collection_id: Uuid,
    label: String,
}

impl OwnershipMarker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            collection_id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    pub fn collection_id(&self) -> Uuid {
        self.collection_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for OwnershipMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.collection_id)
    }
}
