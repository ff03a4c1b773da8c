use super::{Backend, Capabilities};
use crate::config::DirectoryConfig;
use crate::core::{CorpusError, Result};
use globset::{Glob, GlobMatcher};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// One file per document under a root directory.
///
/// A document name is the file path relative to the root with its extension
/// removed and `/` as separator. Dot files are skipped.
pub struct DirectoryBackend {
    root: PathBuf,
    recursive: bool,
    filter: Option<GlobMatcher>,
    extension: String,
    read_only: bool,
    /// Every file found for a name; more than one makes the name ambiguous
    files: BTreeMap<String, Vec<PathBuf>>,
}

impl DirectoryBackend {
    pub fn open(config: &DirectoryConfig) -> Result<Self> {
        config.validate()?;

        let filter = match &config.filter {
            Some(pattern) => Some(
                Glob::new(pattern)
                    .map_err(|e| {
                        CorpusError::Configuration(format!("invalid filter '{}': {}", pattern, e))
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };

        Ok(Self {
            root: config.root.clone(),
            recursive: config.recursive,
            filter,
            extension: config.effective_extension()?,
            read_only: config.read_only,
            files: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(&self) -> Result<BTreeMap<String, Vec<PathBuf>>> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| CorpusError::Io(format!("directory scan: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| CorpusError::Io(e.to_string()))?;
            if let Some(filter) = &self.filter {
                if !filter.is_match(relative) {
                    continue;
                }
            }
            files
                .entry(document_name(relative))
                .or_default()
                .push(entry.path().to_path_buf());
        }
        Ok(files)
    }

    fn path_of(&self, name: &str) -> Result<&Path> {
        match self.files.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(CorpusError::NotFound(name.to_string())),
            Some([path]) => Ok(path.as_path()),
            Some(paths) => Err(CorpusError::Ambiguous {
                name: name.to_string(),
                matches: paths.len(),
            }),
        }
    }

    fn reject_when_read_only(&self, operation: &str) -> Result<()> {
        if self.read_only {
            return Err(CorpusError::unsupported(operation, "directory is opened read-only"));
        }
        Ok(())
    }

    /// Path a new document named `name` is created at. The file must be one
    /// the next scan of this directory would pick up again.
    fn new_path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = PathBuf::from(format!("{}.{}", name, self.extension));
        let components: Vec<Component> = Path::new(name).components().collect();
        let valid = !name.is_empty()
            && components
                .iter()
                .all(|component| match component {
                    Component::Normal(part) => !is_hidden(part),
                    _ => false,
                });
        if !valid {
            return Err(CorpusError::Configuration(format!(
                "'{}' cannot be used as a file name",
                name
            )));
        }
        if !self.recursive && components.len() > 1 {
            return Err(CorpusError::Configuration(format!(
                "'{}' names a subdirectory of a non-recursive collection",
                name
            )));
        }
        if let Some(filter) = &self.filter {
            if !filter.is_match(&relative) {
                return Err(CorpusError::Configuration(format!(
                    "'{}' does not match the collection filter",
                    relative.display()
                )));
            }
        }
        Ok(self.root.join(relative))
    }
}

impl Backend for DirectoryBackend {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn list_names(&mut self) -> Result<Vec<String>> {
        self.files = self.scan()?;
        debug!(
            "Scanned {} documents under {}",
            self.files.len(),
            self.root.display()
        );
        Ok(self.files.keys().cloned().collect())
    }

    fn fetch(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CorpusError::NotFound(name.to_string()),
            _ => CorpusError::Io(format!("reading {}: {}", path.display(), e)),
        })
    }

    fn persist(&mut self, name: &str, content: &[u8]) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let path = self.path_of(name)?;
        if !path.exists() {
            return Err(CorpusError::NotFound(name.to_string()));
        }
        write_atomically(path, content, true)
    }

    fn insert(&mut self, name: &str, content: &[u8]) -> Result<()> {
        self.reject_when_read_only(&format!("inserting '{}'", name))?;
        if self.files.contains_key(name) {
            return Err(CorpusError::Io(format!("document '{}' already has a file", name)));
        }
        let path = self.new_path_for(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomically(&path, content, false)?;
        self.files.insert(name.to_string(), vec![path]);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.reject_when_read_only(&format!("deleting '{}'", name))?;
        let path = self.path_of(name)?.to_path_buf();
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CorpusError::NotFound(name.to_string()),
            _ => CorpusError::Io(format!("removing {}: {}", path.display(), e)),
        })?;
        self.files.remove(name);
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        if self.read_only {
            Capabilities::NONE
        } else {
            Capabilities::ALL
        }
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

fn is_hidden(file_name: &std::ffi::OsStr) -> bool {
    file_name.to_string_lossy().starts_with('.')
}

fn document_name(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write through a temp file in the target's directory, then rename over it.
fn write_atomically(path: &Path, content: &[u8], overwrite: bool) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    let persisted = if overwrite {
        temp.persist(path).map(|_| ())
    } else {
        temp.persist_noclobber(path).map(|_| ())
    };
    persisted.map_err(|e| CorpusError::Io(format!("writing {}: {}", path.display(), e.error)))
}
