pub mod iter;

pub use iter::Documents;

use crate::backend::{self, Backend, Capabilities};
use crate::cache::LoadCache;
use crate::config::CollectionConfig;
use crate::core::{CorpusError, Encoding, Result};
use crate::document::{Document, DocumentFormat, DocumentHandle, OwnershipMarker};
use crate::index::NameIndex;
use log::{debug, info};
use std::sync::{Arc, TryLockError};

/// Ordered, fixed-membership view over the documents of a backend.
///
/// Names are enumerated once at open. Documents are fetched and decoded on
/// first [`get`](Self::get) and kept for the rest of the session, so repeated
/// gets return the same handle. Mutations go through the backend's
/// capability flags before any I/O happens.
///
/// Not internally synchronized: share it across threads behind a lock.
///
/// # Examples
///
/// ```no_run
/// use virtualcorpus::{DirectoryConfig, VirtualCollection};
///
/// # fn main() -> virtualcorpus::Result<()> {
/// let mut corpus = VirtualCollection::open(DirectoryConfig::new("/srv/corpus").into())?;
/// for doc in corpus.iter() {
///     let doc = doc?;
///     println!("{}", doc.read()?.name());
/// }
/// # Ok(())
/// # }
/// ```
pub struct VirtualCollection {
    label: String,
    config: Option<CollectionConfig>,
    backend: Box<dyn Backend>,
    format: DocumentFormat,
    encoding: Encoding,
    index: NameIndex,
    cache: LoadCache,
    marker: OwnershipMarker,
}

impl VirtualCollection {
    /// Open the backend described by `config` and enumerate its documents.
    pub fn open(config: CollectionConfig) -> Result<Self> {
        config.validate()?;
        let (label, format, encoding) = match &config {
            CollectionConfig::Directory(dir) => {
                (dir.root.display().to_string(), dir.format()?, dir.encoding)
            }
            CollectionConfig::Database(db) => (db.table_name.clone(), db.format()?, db.encoding),
        };
        let backend = backend::open(&config)?;
        let mut collection = Self::with_backend(label, backend, format, encoding)?;
        collection.config = Some(config);
        Ok(collection)
    }

    /// Build a collection over an already opened backend.
    pub fn with_backend(
        label: impl Into<String>,
        mut backend: Box<dyn Backend>,
        format: DocumentFormat,
        encoding: Encoding,
    ) -> Result<Self> {
        let label = label.into();
        let index = NameIndex::from_names(backend.list_names()?);
        info!(
            "Opened {} collection '{}' with {} documents{}",
            backend.kind(),
            label,
            index.len(),
            if backend.is_read_only() { " (read-only)" } else { "" }
        );

        Ok(Self {
            cache: LoadCache::with_slots(index.len()),
            marker: OwnershipMarker::new(label.clone()),
            label,
            config: None,
            backend,
            format,
            encoding,
            index,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Open parameters, when the collection was opened from a config
    pub fn config(&self) -> Option<&CollectionConfig> {
        self.config.as_ref()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn is_read_only(&self) -> bool {
        self.backend.is_read_only()
    }

    pub fn marker(&self) -> &OwnershipMarker {
        &self.marker
    }

    /// True if `document` was materialized or adopted by this collection.
    pub fn owns(&self, document: &Document) -> bool {
        document.owner() == Some(&self.marker)
    }

    pub fn name_at(&self, index: usize) -> Result<&str> {
        self.index.name_at(index)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.names()
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.index.index_of(name)
    }

    /// Position of the entry with the same name as `document`. Content is
    /// not compared.
    pub fn index_of(&self, document: &Document) -> Option<usize> {
        self.index.index_of(document.name())
    }

    pub fn contains(&self, document: &Document) -> bool {
        self.index.contains(document.name())
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.cache.is_loaded(index)
    }

    pub fn loaded_count(&self) -> usize {
        self.cache.loaded_count()
    }

    /// Document at `index`, loading it from the backend on first access.
    pub fn get(&mut self, index: usize) -> Result<DocumentHandle> {
        let name = self.index.name_at(index)?.to_string();
        if self.cache.is_loaded(index) {
            return self.cache.get(&name);
        }

        debug!("Loading '{}' from {} backend", name, self.backend.kind());
        let raw = self.backend.fetch(&name)?;
        let mut document = self.format.decode(&name, &raw, self.encoding)?;
        document.adopt(&self.marker);

        let handle = document.into_handle();
        self.cache.store(index, name, Arc::clone(&handle));
        Ok(handle)
    }

    /// Lazy single-pass iteration in index order.
    pub fn iter(&mut self) -> Documents<'_> {
        Documents::new(self)
    }

    /// Drop the cached document at `index` without writing it back. The next
    /// `get` fetches it again.
    pub fn unload(&mut self, index: usize) -> Result<Option<DocumentHandle>> {
        let name = self.index.name_at(index)?.to_string();
        Ok(self.cache.unload(index, &name))
    }

    /// Add a new document and write it to the backend.
    ///
    /// Returns `Ok(false)` without writing when an entry with the same name
    /// already exists.
    pub fn add(&mut self, handle: DocumentHandle) -> Result<bool> {
        if !self.backend.supports_insert() {
            return Err(CorpusError::unsupported(
                "add",
                &format!("{} backend of '{}' does not insert", self.backend.kind(), self.label),
            ));
        }

        let (name, raw) = {
            let document = handle.read()?;
            if self.index.contains(document.name()) {
                return Ok(false);
            }
            if let Some(owner) = document.owner() {
                if *owner != self.marker {
                    return Err(CorpusError::AlreadyOwned(document.name().to_string()));
                }
            }
            let raw = self.format.encode(&document, self.encoding)?;
            (document.name().to_string(), raw)
        };

        self.backend.insert(&name, &raw)?;

        handle.write()?.adopt(&self.marker);
        let position = self.index.append(name.clone());
        self.cache.store(position, name, handle);
        Ok(true)
    }

    /// Remove the entry at `index` and delete it from the backend.
    ///
    /// The backend delete runs first; if it fails nothing in memory has
    /// changed. Later entries shift down by one and keep their cached
    /// documents. Returns the cached document, if it was loaded.
    pub fn remove(&mut self, index: usize) -> Result<Option<DocumentHandle>> {
        self.check_delete("remove")?;
        let name = self.index.name_at(index)?.to_string();

        self.backend.delete(&name)?;

        let evicted = self.cache.evict(index, &name);
        self.index.remove(index)?;
        if let Some(handle) = &evicted {
            handle.write()?.release();
        }
        debug!("Removed '{}' from '{}'", name, self.label);
        Ok(evicted)
    }

    /// Remove the entry named like `document`. Returns `Ok(false)` when no
    /// such entry exists.
    pub fn remove_document(&mut self, document: &Document) -> Result<bool> {
        self.check_delete("remove")?;
        match self.index_of(document) {
            Some(index) => {
                self.remove(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every entry, last to first.
    pub fn clear(&mut self) -> Result<()> {
        self.check_delete("clear")?;
        for index in (0..self.index.len()).rev() {
            self.remove(index)?;
        }
        Ok(())
    }

    /// Write the current state of `document` back to the backend.
    ///
    /// A no-op on a read-only collection. Saving a copy of a loaded document
    /// also copies its content and features into the cached one.
    pub fn save(&mut self, document: &Document) -> Result<()> {
        if self.backend.is_read_only() {
            debug!("Not saving '{}': '{}' is read-only", document.name(), self.label);
            return Ok(());
        }
        if !self.backend.supports_update() {
            return Err(CorpusError::unsupported(
                "save",
                &format!("{} backend of '{}' does not update", self.backend.kind(), self.label),
            ));
        }
        let Some(index) = self.index.index_of(document.name()) else {
            return Err(CorpusError::NotFound(document.name().to_string()));
        };

        let raw = self.format.encode(document, self.encoding)?;
        self.backend.persist(document.name(), &raw)?;
        debug!("Saved '{}' to {} backend", document.name(), self.backend.kind());

        if self.cache.is_loaded(index) {
            let cached = self.cache.get(document.name())?;
            if !is_same_document(&cached, document)? {
                let mut target = cached.write()?;
                target.set_content(document.content());
                *target.features_mut() = document.features().clone();
            }
        }
        Ok(())
    }

    /// Save the loaded document at `index`; unloaded entries have nothing
    /// to write.
    pub fn save_index(&mut self, index: usize) -> Result<()> {
        let name = self.index.name_at(index)?.to_string();
        if !self.cache.is_loaded(index) {
            return Ok(());
        }
        let handle = self.cache.get(&name)?;
        let document = handle.read()?;
        self.save(&document)
    }

    /// Release the backend. Errors while closing are logged, never returned.
    pub fn close(mut self) {
        self.backend.close();
        info!("Closed collection '{}'", self.label);
    }

    fn check_delete(&self, operation: &str) -> Result<()> {
        if !self.backend.supports_delete() {
            return Err(CorpusError::unsupported(
                operation,
                &format!("{} backend of '{}' does not delete", self.backend.kind(), self.label),
            ));
        }
        Ok(())
    }
}

/// True if `document` is the value behind `handle`. A handle that is write
/// locked can only be the caller's own guard, since the collection is not
/// shared while `save` runs.
fn is_same_document(handle: &DocumentHandle, document: &Document) -> Result<bool> {
    match handle.try_read() {
        Ok(guard) => Ok(std::ptr::eq(&*guard, document)),
        Err(TryLockError::WouldBlock) => Ok(true),
        Err(TryLockError::Poisoned(e)) => Err(e.into()),
    }
}
