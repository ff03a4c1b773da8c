pub mod encoding;
pub mod error;

pub use encoding::Encoding;
pub use error::{CorpusError, Result};
