use super::VirtualCollection;
use crate::core::Result;
use crate::document::DocumentHandle;

/// Single-pass iterator over a collection's documents in index order.
///
/// Each step goes through [`VirtualCollection::get`], so documents load
/// lazily and land in the collection's cache. Start a new iteration to go
/// over the documents again.
pub struct Documents<'a> {
    collection: &'a mut VirtualCollection,
    next: usize,
}

impl<'a> Documents<'a> {
    pub(super) fn new(collection: &'a mut VirtualCollection) -> Self {
        Self {
            collection,
            next: 0,
        }
    }
}

impl Iterator for Documents<'_> {
    type Item = Result<DocumentHandle>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.collection.len() {
            return None;
        }
        let item = self.collection.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.collection.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}
