// ============================================================================
// VirtualCorpus Library
// ============================================================================

//! Lazy-loading document collections whose content lives in an external
//! store: a directory of files or one column of a database table.
//!
//! ```no_run
//! use virtualcorpus::{DatabaseConfig, VirtualCollection};
//!
//! # fn main() -> virtualcorpus::Result<()> {
//! let config = DatabaseConfig::new("sqlite:${dbdirectory}/corpus.db", "docs", "id", "body")
//!     .db_directory("/var/lib/corpus");
//! let mut corpus = VirtualCollection::open(config.into())?;
//!
//! let doc = corpus.get(0)?;
//! doc.write()?.set_content("rewritten");
//! corpus.save(&*doc.read()?)?;
//! corpus.close();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod collection;
pub mod config;
pub mod core;
pub mod document;
pub mod index;

// Re-export main types for convenience
pub use backend::{Backend, Capabilities, DatabaseBackend, DirectoryBackend};
pub use cache::LoadCache;
pub use collection::{Documents, VirtualCollection};
pub use config::{CollectionConfig, DatabaseConfig, DirectoryConfig};
pub use crate::core::{CorpusError, Encoding, Result};
pub use document::{Document, DocumentFormat, DocumentHandle, OwnershipMarker};
pub use index::NameIndex;
