//! Backing stores a collection mirrors.
//!
//! A backend deals in raw content only. Decoding into documents, caching and
//! mutation policy live in [`crate::collection`].

pub mod database;
pub mod directory;

pub use database::DatabaseBackend;
pub use directory::DirectoryBackend;

use crate::config::CollectionConfig;
use crate::core::{CorpusError, Result};

/// Static mutation capabilities of an opened backend.
///
/// The collection checks these before any I/O so an illegal mutation is
/// rejected without touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub insert: bool,
    pub delete: bool,
    pub update: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        insert: false,
        delete: false,
        update: false,
    };

    pub const ALL: Capabilities = Capabilities {
        insert: true,
        delete: true,
        update: true,
    };
}

pub trait Backend: Send {
    /// Short label for log lines, e.g. `directory` or `database`
    fn kind(&self) -> &'static str;

    /// Enumerate document names in collection order. Called once at open.
    fn list_names(&mut self) -> Result<Vec<String>>;

    /// Raw content stored under `name`.
    ///
    /// Fails with `NotFound` when no record matches and with `Ambiguous` when
    /// more than one does.
    fn fetch(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Overwrite the content of an existing record. A read-only backend
    /// returns `Ok(())` without writing.
    fn persist(&mut self, name: &str, content: &[u8]) -> Result<()>;

    /// Create a new record.
    fn insert(&mut self, name: &str, _content: &[u8]) -> Result<()> {
        Err(CorpusError::unsupported(
            &format!("inserting '{}'", name),
            &format!("{} backend does not create records", self.kind()),
        ))
    }

    /// Delete an existing record.
    fn delete(&mut self, name: &str) -> Result<()> {
        Err(CorpusError::unsupported(
            &format!("deleting '{}'", name),
            &format!("{} backend does not delete records", self.kind()),
        ))
    }

    fn capabilities(&self) -> Capabilities;

    fn is_read_only(&self) -> bool;

    /// Release connections and statements. Failures are logged, never returned.
    fn close(&mut self) {}

    fn supports_insert(&self) -> bool {
        self.capabilities().insert
    }

    fn supports_delete(&self) -> bool {
        self.capabilities().delete
    }

    fn supports_update(&self) -> bool {
        self.capabilities().update
    }
}

/// Open the backend described by `config`.
pub fn open(config: &CollectionConfig) -> Result<Box<dyn Backend>> {
    match config {
        CollectionConfig::Directory(dir) => Ok(Box::new(DirectoryBackend::open(dir)?)),
        CollectionConfig::Database(db) => Ok(Box::new(DatabaseBackend::open(db)?)),
    }
}
