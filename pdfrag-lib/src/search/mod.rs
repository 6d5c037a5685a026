//! High-level search interface
//!
//! Combines embedder and store into a unified search API.
//!
//! # Usage
//!
//! ```ignore
//! use pdfrag_lib::search::SearchEngine;
//!
//! let mut engine = SearchEngine::new(embedder, store);
//! engine.index(&chunks).await?;
//! let results = engine.search("What is Attention?", 4).await?;
//! ```

use crate::chunk::Chunk;
use crate::embed::Embedder;
use crate::store::{SearchResult, VectorStore};
use crate::{Error, Result};

/// Texts sent to the embedder per request unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// High-level search engine combining embedding and storage.
pub struct SearchEngine<E: Embedder, S: VectorStore> {
    embedder: E,
    store: S,
    batch_size: usize,
}

impl<E: Embedder, S: VectorStore> SearchEngine<E, S> {
    /// Create a new search engine.
    #[must_use]
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set how many chunks are embedded per request (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Index chunks by computing embeddings and storing them.
    ///
    /// Batches are embedded and stored one after another; the first failure
    /// aborts indexing, leaving earlier batches stored.
    pub async fn index(&mut self, chunks: &[Chunk]) -> Result<()> {
        for (i, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let embeddings = self.embedder.embed_documents(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "{} returned {} embeddings for {} texts",
                    self.embedder.model_name(),
                    embeddings.len(),
                    batch.len()
                )));
            }

            self.store.insert(batch, &embeddings).await?;
            tracing::debug!(batch = i, chunks = batch.len(), "indexed batch");
        }

        Ok(())
    }

    /// Search for chunks similar to the query using vector similarity.
    pub async fn search(&mut self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_query(query).await?;
        self.store.search(&query_embedding, k).await
    }

    /// Returns the number of indexed chunks.
    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }

    /// Returns `true` if no chunks are indexed.
    pub async fn is_empty(&self) -> Result<bool> {
        self.store.is_empty().await
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a mutable reference to the store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
