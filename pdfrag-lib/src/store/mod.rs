//! Vector storage backends
//!
//! [`QdrantStore`] persists chunks in a Qdrant collection so ingesting and
//! querying can happen in separate runs. [`MemoryStore`] keeps everything in
//! process, for tests and one-shot demos.
//!
//! # Storage Model
//!
//! Each stored item consists of:
//! - Chunk: the original text and metadata
//! - Embedding: the vector representation
//!
//! # Usage
//!
//! ```ignore
//! use pdfrag_lib::store::{VectorStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//!
//! // Insert chunks with their embeddings
//! store.insert(&chunks, &embeddings).await?;
//!
//! // Search by vector similarity
//! let results = store.search(&query_embedding, 4).await?;
//! ```

use async_trait::async_trait;

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::{Error, Result};

/// A search result with similarity score
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (higher is more similar)
    /// For cosine similarity: -1.0 to 1.0
    pub score: f32,
}

/// Trait for vector storage backends
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embeddings
    ///
    /// Chunks whose id is already stored are replaced.
    ///
    /// # Arguments
    /// * `chunks` - The text chunks to store
    /// * `embeddings` - Corresponding embeddings (must be same length)
    async fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()>;

    /// Search for similar chunks
    ///
    /// # Arguments
    /// * `query_embedding` - The query vector
    /// * `k` - Number of results to return
    ///
    /// # Returns
    /// Top-k results sorted by similarity (highest first)
    async fn search(&self, query_embedding: &Embedding, k: usize) -> Result<Vec<SearchResult>>;

    /// Get total number of stored chunks
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Clear all stored data
    async fn clear(&mut self) -> Result<()>;
}

/// Reject `insert` calls whose inputs do not pair up.
pub(crate) fn check_pairs(chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
    if chunks.len() != embeddings.len() {
        return Err(Error::InvalidInput(format!(
            "{} chunks but {} embeddings",
            chunks.len(),
            embeddings.len()
        )));
    }
    Ok(())
}

mod memory;
mod qdrant;

pub use memory::*;
pub use qdrant::*;
