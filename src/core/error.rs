use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Document '{0}' not found in backing store")]
    NotFound(String),

    #[error("Document name '{name}' matches {matches} records in backing store")]
    Ambiguous { name: String, matches: usize },

    #[error("Unsupported mutation: {0}")]
    UnsupportedMutation(String),

    #[error("Index {index} out of range for collection of size {size}")]
    OutOfRange { index: usize, size: usize },

    #[error("Document '{0}' is owned by another collection")]
    AlreadyOwned(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, CorpusError>;

impl CorpusError {
    /// Shorthand used by backends and policy checks for rejected mutations.
    pub fn unsupported(operation: &str, reason: &str) -> Self {
        Self::UnsupportedMutation(format!("{} is not supported: {}", operation, reason))
    }
}

impl<T> From<std::sync::PoisonError<T>> for CorpusError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<std::io::Error> for CorpusError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for CorpusError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Io(format!("database: {}", err))
    }
}

impl From<serde_json::Error> for CorpusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(format!("json: {}", err))
    }
}

impl From<rmp_serde::encode::Error> for CorpusError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Codec(format!("msgpack: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for CorpusError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Codec(format!("msgpack: {}", err))
    }
}
