pub mod database;
pub mod directory;
pub mod vars;

pub use database::DatabaseConfig;
pub use directory::DirectoryConfig;

use crate::core::{CorpusError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Everything needed to reopen an equivalent collection.
///
/// Only open parameters are stored. Loaded documents and connection state
/// are never part of the persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum CollectionConfig {
    Directory(DirectoryConfig),
    Database(DatabaseConfig),
}

impl CollectionConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            CollectionConfig::Directory(config) => config.validate(),
            CollectionConfig::Database(config) => config.validate(),
        }
    }

    pub fn is_read_only(&self) -> bool {
        match self {
            CollectionConfig::Directory(config) => config.read_only,
            CollectionConfig::Database(config) => config.read_only,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CorpusError::Configuration(format!("invalid collection config: {}", e)))
    }

    /// Write the configuration to `path`, replacing it atomically.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(self.to_json()?.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| CorpusError::Io(e.error.to_string()))?;
        Ok(())
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }
}

impl From<DirectoryConfig> for CollectionConfig {
    fn from(config: DirectoryConfig) -> Self {
        CollectionConfig::Directory(config)
    }
}

impl From<DatabaseConfig> for CollectionConfig {
    fn from(config: DatabaseConfig) -> Self {
        CollectionConfig::Database(config)
    }
}
