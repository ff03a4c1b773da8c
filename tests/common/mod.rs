#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use virtualcorpus::{
    Backend, Capabilities, CorpusError, Document, DocumentFormat, Encoding, Result,
    VirtualCollection,
};

/// Records shared between a test and the backend it handed to a collection,
/// so the test can change the store behind the collection's back.
pub type Records = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

pub struct MemoryBackend {
    pub records: Records,
    pub capabilities: Capabilities,
    pub read_only: bool,
    pub fail_deletes: bool,
}

impl MemoryBackend {
    pub fn new(records: Records) -> Self {
        Self {
            records,
            capabilities: Capabilities::ALL,
            read_only: false,
            fail_deletes: false,
        }
    }
}

impl Backend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn list_names(&mut self) -> Result<Vec<String>> {
        Ok(self.records.lock()?.iter().map(|(name, _)| name.clone()).collect())
    }

    fn fetch(&mut self, name: &str) -> Result<Vec<u8>> {
        let records = self.records.lock()?;
        let matches: Vec<_> = records.iter().filter(|(n, _)| n == name).collect();
        match matches.as_slice() {
            [] => Err(CorpusError::NotFound(name.to_string())),
            [(_, content)] => Ok(content.clone()),
            many => Err(CorpusError::Ambiguous {
                name: name.to_string(),
                matches: many.len(),
            }),
        }
    }

    fn persist(&mut self, name: &str, content: &[u8]) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let mut records = self.records.lock()?;
        match records.iter_mut().find(|(n, _)| n == name) {
            Some((_, stored)) => {
                *stored = content.to_vec();
                Ok(())
            }
            None => Err(CorpusError::NotFound(name.to_string())),
        }
    }

    fn insert(&mut self, name: &str, content: &[u8]) -> Result<()> {
        self.records.lock()?.push((name.to_string(), content.to_vec()));
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(CorpusError::Io(format!("delete of '{}' failed", name)));
        }
        self.records.lock()?.retain(|(n, _)| n != name);
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

pub fn plain_records(names: &[&str]) -> Records {
    Arc::new(Mutex::new(
        names
            .iter()
            .map(|name| (name.to_string(), format!("text of {}", name).into_bytes()))
            .collect(),
    ))
}

pub fn memory_collection(backend: MemoryBackend) -> VirtualCollection {
    VirtualCollection::with_backend("memory", Box::new(backend), DocumentFormat::PlainText, Encoding::Utf8)
        .unwrap()
}

pub fn name_of(collection: &mut VirtualCollection, index: usize) -> String {
    collection.get(index).unwrap().read().unwrap().name().to_string()
}

pub fn json_document(name: &str, content: &str) -> Vec<u8> {
    DocumentFormat::Json
        .encode(&Document::new(name, content), Encoding::Utf8)
        .unwrap()
}
