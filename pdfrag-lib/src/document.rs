//! Source documents handed to the chunker

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form metadata attached to a document (source path, page number, ...)
pub type Metadata = serde_json::Map<String, Value>;

/// A unit of input text, usually one page of a PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The extracted text
    pub content: String,
    /// Where the text came from
    pub metadata: Metadata,
}

impl Document {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The `source` metadata entry, if it is a string.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }

    /// The `page` metadata entry, if present.
    #[must_use]
    pub fn page(&self) -> Option<u64> {
        self.metadata.get("page").and_then(Value::as_u64)
    }
}
