//! Text embedding
//!
//! Two backends are provided:
//!
//! - [`OpenAiEmbedder`]: any OpenAI-compatible `/v1/embeddings` endpoint,
//!   `text-embedding-3-large` by default (3072 dimensions).
//! - [`BgeEmbedder`]: BAAI/bge-large-en-v1.5 run locally through fastembed
//!   (ONNX runtime), for offline use.
//!
//! # Usage
//!
//! ```ignore
//! use pdfrag_lib::embed::{Embedder, OpenAiEmbedder};
//!
//! let mut embedder = OpenAiEmbedder::new(api_key, "text-embedding-3-large", None, None)?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Attention...", "BERT..."]).await?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("What is Attention?").await?;
//! ```

use async_trait::async_trait;

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Returns one embedding per input, in input order.
    async fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    ///
    /// Note: Some models (like BGE) use different prompts for queries vs documents.
    /// This method handles that distinction.
    async fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod bge;
mod openai;

pub use bge::*;
pub use openai::*;
