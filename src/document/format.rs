//! Serialization formats for document content in the backing store.

use super::Document;
use crate::core::{CorpusError, Encoding, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MIME_TYPE: &str = "application/json";

/// Stored shape of a document in the structured formats.
///
/// The name is not part of the record: it is the key the backend stores the
/// record under.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    content: String,
    #[serde(default)]
    features: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// Content plus features as a JSON object (native format)
    #[default]
    Json,
    /// Content plus features as MessagePack
    MessagePack,
    /// Raw text; features are neither read nor written
    PlainText,
}

impl DocumentFormat {
    pub fn from_mime(mime: &str) -> Result<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "" | DEFAULT_MIME_TYPE => Ok(DocumentFormat::Json),
            "application/msgpack" | "application/x-msgpack" => Ok(DocumentFormat::MessagePack),
            "text/plain" => Ok(DocumentFormat::PlainText),
            other => Err(CorpusError::Configuration(format!(
                "unsupported document mime type '{}'",
                other
            ))),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Json => DEFAULT_MIME_TYPE,
            DocumentFormat::MessagePack => "application/msgpack",
            DocumentFormat::PlainText => "text/plain",
        }
    }

    /// File extension used when a directory backend creates a new file.
    pub fn default_extension(&self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::MessagePack => "msgpack",
            DocumentFormat::PlainText => "txt",
        }
    }

    pub fn decode(&self, name: &str, raw: &[u8], encoding: Encoding) -> Result<Document> {
        let record = match self {
            DocumentFormat::Json => {
                let text = encoding.decode(raw)?;
                serde_json::from_str::<DocumentRecord>(&text)?
            }
            DocumentFormat::MessagePack => rmp_serde::from_slice::<DocumentRecord>(raw)?,
            DocumentFormat::PlainText => DocumentRecord {
                content: encoding.decode(raw)?,
                features: BTreeMap::new(),
            },
        };

        let mut document = Document::new(name, record.content);
        *document.features_mut() = record.features;
        Ok(document)
    }

    pub fn encode(&self, document: &Document, encoding: Encoding) -> Result<Vec<u8>> {
        match self {
            DocumentFormat::Json => {
                let text = serde_json::to_string(&Self::record_of(document))?;
                encoding.encode(&text)
            }
            DocumentFormat::MessagePack => Ok(rmp_serde::to_vec_named(&Self::record_of(document))?),
            DocumentFormat::PlainText => encoding.encode(document.content()),
        }
    }

    fn record_of(document: &Document) -> DocumentRecord {
        DocumentRecord {
            content: document.content().to_string(),
            features: document.features().clone(),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_mime(s)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new("doc1", "Hello wörld").with_feature("lang", "en")
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(DocumentFormat::from_mime("").unwrap(), DocumentFormat::Json);
        assert_eq!(
            DocumentFormat::from_mime("Text/Plain").unwrap(),
            DocumentFormat::PlainText
        );
        assert!(matches!(
            DocumentFormat::from_mime("application/pdf"),
            Err(CorpusError::Configuration(_))
        ));
    }

    #[test]
    fn test_json_keeps_features() {
        let raw = DocumentFormat::Json.encode(&sample(), Encoding::Utf8).unwrap();
        let decoded = DocumentFormat::Json.decode("doc1", &raw, Encoding::Utf8).unwrap();
        assert_eq!(decoded.content(), "Hello wörld");
        assert_eq!(decoded.feature("lang"), Some("en"));
        assert!(decoded.owner().is_none());
    }

    #[test]
    fn test_json_features_optional() {
        let decoded = DocumentFormat::Json
            .decode("x", br#"{"content":"abc"}"#, Encoding::Utf8)
            .unwrap();
        assert_eq!(decoded.name(), "x");
        assert!(decoded.features().is_empty());
    }

    #[test]
    fn test_msgpack_keeps_features() {
        let raw = DocumentFormat::MessagePack.encode(&sample(), Encoding::Utf8).unwrap();
        let decoded = DocumentFormat::MessagePack.decode("doc1", &raw, Encoding::Utf8).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_plain_text_drops_features() {
        let raw = DocumentFormat::PlainText.encode(&sample(), Encoding::Latin1).unwrap();
        assert_eq!(raw.len(), "Hello wörld".chars().count());
        let decoded = DocumentFormat::PlainText.decode("doc1", &raw, Encoding::Latin1).unwrap();
        assert_eq!(decoded.content(), "Hello wörld");
        assert!(decoded.features().is_empty());
    }

    #[test]
    fn test_malformed_json_is_codec_error() {
        assert!(matches!(
            DocumentFormat::Json.decode("bad", b"<xml/>", Encoding::Utf8),
            Err(CorpusError::Codec(_))
        ));
    }
}
