use crate::core::{CorpusError, Result};
use std::collections::HashMap;

/// Bidirectional mapping between document names and their positions.
///
/// `names[positions[n]] == n` holds for every name after every public call;
/// both maps are updated inside the same `&mut self` method so no caller
/// can observe one without the other.
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a backend enumeration. Duplicate names collapse onto
    /// their first position.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for name in names {
            let name = name.into();
            if !index.positions.contains_key(&name) {
                index.append(name);
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name_at(&self, index: usize) -> Result<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(CorpusError::OutOfRange {
                index,
                size: self.names.len(),
            })
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Append a new name and return its position. Returns the existing
    /// position if the name is already indexed.
    pub fn append(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&existing) = self.positions.get(&name) {
            return existing;
        }
        let position = self.names.len();
        self.positions.insert(name.clone(), position);
        self.names.push(name);
        position
    }

    /// Remove the name at `index`, shifting every later position down by one.
    pub fn remove(&mut self, index: usize) -> Result<String> {
        if index >= self.names.len() {
            return Err(CorpusError::OutOfRange {
                index,
                size: self.names.len(),
            });
        }
        let name = self.names.remove(index);
        self.positions.remove(&name);
        for (position, later) in self.names.iter().enumerate().skip(index) {
            if let Some(slot) = self.positions.get_mut(later) {
                *slot = position;
            }
        }
        Ok(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
