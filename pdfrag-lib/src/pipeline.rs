//! Ingest and query, as two separate operations
//!
//! ```text
//! ingest: files -> loader -> splitter -> embedder -> store
//! query:  text  -> embedder -> store -> ranked chunks
//! ```
//!
//! Both share one [`Pipeline`] built from [`Settings`], so a process can
//! ingest, query, or do both against the same collection.

use std::path::PathBuf;

use crate::chunk::{Chunk, Chunker, RecursiveCharacterSplitter};
use crate::config::Settings;
use crate::document::Document;
use crate::embed::Embedder;
use crate::loader::{load_all, DocumentLoader};
use crate::search::SearchEngine;
use crate::store::{SearchResult, VectorStore};
use crate::Result;

/// Counts reported by [`Pipeline::ingest`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Documents (pages) loaded
    pub documents: usize,
    /// Chunks embedded and stored
    pub chunks: usize,
}

pub struct Pipeline<L: DocumentLoader, E: Embedder, S: VectorStore> {
    loader: L,
    splitter: RecursiveCharacterSplitter,
    engine: SearchEngine<E, S>,
    sources: Vec<PathBuf>,
    default_k: usize,
}

impl<L: DocumentLoader, E: Embedder, S: VectorStore> Pipeline<L, E, S> {
    pub fn new(settings: &Settings, loader: L, embedder: E, store: S) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            loader,
            splitter: RecursiveCharacterSplitter::new(settings.chunking.splitter())?,
            engine: SearchEngine::new(embedder, store)
                .with_batch_size(settings.embedding.batch_size),
            sources: settings.documents.paths(),
            default_k: settings.search.k,
        })
    }

    /// Load every configured file, in order.
    pub fn load(&self) -> Result<Vec<Document>> {
        load_all(&self.loader, &self.sources)
    }

    /// Split documents into chunks without embedding them.
    #[must_use]
    pub fn chunk(&self, documents: &[Document]) -> Vec<Chunk> {
        self.splitter.split_documents(documents)
    }

    /// Load, chunk, embed and store every configured file.
    pub async fn ingest(&mut self) -> Result<IngestSummary> {
        tracing::info!(files = self.sources.len(), "loading documents");
        let documents = self.load()?;
        self.ingest_documents(&documents).await
    }

    /// Chunk, embed and store documents that are already loaded.
    pub async fn ingest_documents(&mut self, documents: &[Document]) -> Result<IngestSummary> {
        let chunks = self.chunk(documents);
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            model = self.engine.embedder().model_name(),
            "indexing chunks"
        );

        self.engine.index(&chunks).await?;

        Ok(IngestSummary {
            documents: documents.len(),
            chunks: chunks.len(),
        })
    }

    /// Return the chunks most similar to `text`, best first.
    ///
    /// Uses the configured `search.k` when `k` is `None`.
    pub async fn query(&mut self, text: &str, k: Option<usize>) -> Result<Vec<SearchResult>> {
        let k = k.unwrap_or(self.default_k);
        tracing::info!(query = text, k, "searching");
        self.engine.search(text, k).await
    }

    #[must_use]
    pub fn engine(&self) -> &SearchEngine<E, S> {
        &self.engine
    }

    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}
