//! pdfrag - chunk, embed and search a set of PDF papers
//!
//! # Architecture
//!
//! ```text
//! PDF -> Loader -> Chunker -> Embedder -> Store
//!                                           |
//! Query -> Embedder -> Search <-------------+
//!                         |
//!                      Results
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pdfrag_lib::{
//!     config::Settings, embed::OpenAiEmbedder, loader::FileLoader,
//!     pipeline::Pipeline, store::QdrantStore,
//! };
//!
//! let settings = Settings::load()?;
//! let embedder = OpenAiEmbedder::from_config(&settings.embedding)?;
//! let store = QdrantStore::from_config(&settings.store)?;
//! let mut pipeline = Pipeline::new(&settings, FileLoader, embedder, store)?;
//!
//! // Index the configured papers
//! pipeline.ingest().await?;
//!
//! // Search
//! let results = pipeline.query("What is Attention?", None).await?;
//! ```

pub mod chunk;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod search;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
