//! Document chunking
//!
//! Pages coming out of a loader are far too long to embed as a whole, so they
//! are split into overlapping chunks. The splitter shipped here is
//! [`RecursiveCharacterSplitter`], which tries coarse boundaries (paragraphs)
//! before fine ones (lines, words, characters).
//!
//! # Implementing a Chunker
//!
//! ```ignore
//! use pdfrag_lib::chunk::{Chunk, Chunker};
//! use pdfrag_lib::document::Document;
//!
//! struct MyChunker { /* ... */ }
//!
//! impl Chunker for MyChunker {
//!     fn name(&self) -> &str {
//!         "mine"
//!     }
//!
//!     fn chunk(&self, document: &Document) -> Vec<Chunk> {
//!         // Your chunking logic here
//!         todo!()
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::document::{Document, Metadata};
use crate::Result;

/// A chunk of text with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Stable identifier derived from source, offset and content
    pub id: String,
    /// The text content of this chunk
    pub content: String,
    /// Metadata about the source and position
    pub metadata: ChunkMetadata,
}

/// Metadata associated with a chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Index of this chunk within its document (0-indexed)
    #[serde(default)]
    pub position: usize,
    /// Character offset of the chunk within the document text
    #[serde(default)]
    pub start_index: usize,
    /// Total number of chunks from this document
    pub total_chunks: Option<usize>,
    /// Metadata copied from the source document
    #[serde(flatten)]
    pub extra: Metadata,
}

impl ChunkMetadata {
    /// Metadata for a chunk of `document`, before positions are known.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        Self {
            extra: document.metadata.clone(),
            ..Self::default()
        }
    }

    /// Look up a value copied from the source document.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// The `source` entry inherited from the document.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.get("source").and_then(Value::as_str)
    }
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split one document into chunks
    ///
    /// Every chunk carries a copy of the document's metadata plus its
    /// position. Empty documents yield no chunks.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;

    /// Split a sequence of documents, preserving document order.
    fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.chunk(doc)).collect()
    }
}

/// Split `documents` with a [`RecursiveCharacterSplitter`] built from the
/// given parameters.
pub fn split(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Result<Vec<Chunk>> {
    let splitter = RecursiveCharacterSplitter::new(SplitterConfig {
        chunk_size,
        chunk_overlap,
        separators: separators.iter().map(|s| (*s).to_string()).collect(),
        ..SplitterConfig::default()
    })?;
    Ok(splitter.split_documents(documents))
}

/// Derive a chunk id that survives re-ingestion of the same document.
///
/// The id is the first 8 bytes of a SHA-256 digest in lowercase hex, so it
/// also parses as a `u64`.
pub(crate) fn generate_id(metadata: &Metadata, start_index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    // Map is ordered, so the JSON rendering is stable
    hasher.update(Value::Object(metadata.clone()).to_string().as_bytes());
    hasher.update((start_index as u64).to_le_bytes());
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();

    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

mod recursive;

pub use recursive::*;
