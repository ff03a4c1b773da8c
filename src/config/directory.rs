use crate::core::{CorpusError, Encoding, Result};
use crate::document::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Open parameters for a collection mirroring a directory of files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory holding one file per document
    pub root: PathBuf,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Glob matched against the path relative to `root`, e.g. `*.json`
    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default)]
    pub encoding: Encoding,

    /// Mime type of the file content; empty means the native JSON format
    #[serde(default)]
    pub mime_type: String,

    /// Extension for files created by `add`; defaults to the format's own
    #[serde(default)]
    pub extension: Option<String>,

    /// Never write to, create or delete files
    #[serde(default)]
    pub read_only: bool,
}

impl DirectoryConfig {
    /// Create a new directory configuration
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            recursive: false,
            filter: None,
            encoding: Encoding::Utf8,
            mime_type: String::new(),
            extension: None,
            read_only: false,
        }
    }

    /// Set whether subdirectories are scanned
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the glob filter
    pub fn filter(mut self, glob: &str) -> Self {
        self.filter = Some(glob.to_string());
        self
    }

    /// Set the text encoding
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the mime type of the file content
    pub fn mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = mime_type.to_string();
        self
    }

    /// Set the extension for created files
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.trim_start_matches('.').to_string());
        self
    }

    /// Set read-only mode
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn format(&self) -> Result<DocumentFormat> {
        DocumentFormat::from_mime(&self.mime_type)
    }

    /// Extension given to files created by this collection
    pub fn effective_extension(&self) -> Result<String> {
        match &self.extension {
            Some(ext) => Ok(ext.clone()),
            None => Ok(self.format()?.default_extension().to_string()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(CorpusError::Configuration("root directory must not be empty".into()));
        }
        if !self.root.is_dir() {
            return Err(CorpusError::Configuration(format!(
                "root '{}' is not a directory",
                self.root.display()
            )));
        }
        if let Some(ext) = &self.extension {
            if ext.is_empty() || ext.contains('/') || ext.contains('\\') {
                return Err(CorpusError::Configuration(format!("invalid extension '{}'", ext)));
            }
        }
        self.format()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_pattern() {
        let config = DirectoryConfig::new("/tmp/docs")
            .recursive(true)
            .filter("*.txt")
            .mime_type("text/plain")
            .extension(".txt")
            .read_only(true);

        assert!(config.recursive);
        assert_eq!(config.filter.as_deref(), Some("*.txt"));
        assert_eq!(config.extension.as_deref(), Some("txt"));
        assert!(config.read_only);
        assert_eq!(config.format().unwrap(), DocumentFormat::PlainText);
    }

    #[test]
    fn test_effective_extension_follows_format() {
        let config = DirectoryConfig::new("/tmp").mime_type("application/msgpack");
        assert_eq!(config.effective_extension().unwrap(), "msgpack");
        assert_eq!(DirectoryConfig::new("/tmp").effective_extension().unwrap(), "json");
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        assert!(DirectoryConfig::new(dir.path()).validate().is_ok());
        assert!(DirectoryConfig::new("").validate().is_err());
        assert!(DirectoryConfig::new(dir.path().join("missing")).validate().is_err());
        assert!(
            DirectoryConfig::new(dir.path())
                .mime_type("image/png")
                .validate()
                .is_err()
        );
    }
}
