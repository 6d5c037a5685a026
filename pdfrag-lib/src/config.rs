//! Layered configuration.
//!
//! Values are resolved in this order, later sources winning:
//! - built-in defaults (the paper set and parameters the tool ships with)
//! - a TOML file (`pdfrag.toml` unless another path is given)
//! - environment variables prefixed with `PDFRAG_`
//!
//! Nested keys use a double underscore, so `PDFRAG_CHUNKING__CHUNK_SIZE=500`
//! sets `chunking.chunk_size`. When no embedding API key is configured the
//! conventional `OPENAI_API_KEY` variable is used.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::chunk::{SplitterConfig, DEFAULT_SEPARATORS};
use crate::{Error, Result};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "pdfrag.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Which files to ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Directory the file names are relative to
    #[serde(default = "default_documents_dir")]
    pub dir: PathBuf,

    /// Files to ingest, in order
    #[serde(default = "default_files")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Characters per chunk (not bytes!)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Character overlap between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Split boundaries, coarsest first
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,

    #[serde(default)]
    pub strip_whitespace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible HTTP API
    OpenAi,
    /// Local BGE model via fastembed
    FastEmbed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Requested vector size, for models that support shortening
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Qdrant connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Query used when none is given on the command line
    #[serde(default = "default_query")]
    pub query: String,

    /// Number of results to return
    #[serde(default = "default_k")]
    pub k: usize,
}

// Default value functions
fn default_documents_dir() -> PathBuf {
    PathBuf::from("PDFs")
}

fn default_files() -> Vec<String> {
    [
        "Attention_is_all_you_need.pdf",
        "BERT.pdf",
        "Denosing_diffusion.pdf",
        "Neural_Machine_Translation.pdf",
        "Neural_Turing.pdf",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_separators() -> Vec<String> {
    DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect()
}

fn default_provider() -> EmbeddingProvider {
    EmbeddingProvider::OpenAi
}

fn default_model() -> String {
    "text-embedding-3-large".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_store_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "learning_langchain".to_string()
}

fn default_query() -> String {
    "What is Attention?".to_string()
}

fn default_k() -> usize {
    4
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: default_documents_dir(),
            files: default_files(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separators: default_separators(),
            strip_whitespace: false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            dimensions: None,
            batch_size: default_batch_size(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            k: default_k(),
        }
    }
}

impl DocumentsConfig {
    /// Full paths of the configured files, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| self.dir.join(f)).collect()
    }
}

impl ChunkingConfig {
    #[must_use]
    pub fn splitter(&self) -> SplitterConfig {
        SplitterConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            separators: self.separators.clone(),
            strip_whitespace: self.strip_whitespace,
        }
    }
}

impl Settings {
    /// Load from `pdfrag.toml` in the working directory (if present) and the
    /// environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file; a missing file contributes nothing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Settings::default()))
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed("PDFRAG_").split("__")),
        )
    }

    /// Parse settings from TOML text layered over the defaults.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Settings::default()))
                .merge(Toml::string(toml)),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let mut settings: Settings = figment.extract()?;

        if settings.embedding.api_key.is_none() {
            settings.embedding.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        self.chunking.splitter().validate()?;

        if self.documents.files.is_empty() {
            return Err(Error::Config("documents.files is empty".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be > 0".into()));
        }
        if self.search.k == 0 {
            return Err(Error::Config("search.k must be > 0".into()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(Error::Config("store.collection must not be empty".into()));
        }
        Ok(())
    }

    /// Render as TOML with secrets masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        let mask = |key: &mut Option<String>| {
            if key.is_some() {
                *key = Some("***".to_string());
            }
        };
        mask(&mut shown.embedding.api_key);
        mask(&mut shown.store.api_key);

        toml::to_string_pretty(&shown).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.chunking.separators, vec!["\n\n", "\n", " ", ""]);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(settings.embedding.model, "text-embedding-3-large");
        assert_eq!(settings.store.url, "http://localhost:6333");
        assert_eq!(settings.store.collection, "learning_langchain");
        assert_eq!(settings.search.query, "What is Attention?");
        assert_eq!(settings.search.k, 4);
        assert_eq!(settings.documents.files.len(), 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_paths_keep_file_order() {
        let settings = Settings::default();
        let paths = settings.documents.paths();

        assert_eq!(paths[0], PathBuf::from("PDFs/Attention_is_all_you_need.pdf"));
        assert_eq!(paths[4], PathBuf::from("PDFs/Neural_Turing.pdf"));
    }

    #[test]
    fn test_partial_toml_overrides() {
        let settings = Settings::from_toml(
            r#"
            [chunking]
            chunk_size = 500
            chunk_overlap = 50

            [embedding]
            provider = "fastembed"

            [search]
            k = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 50);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::FastEmbed);
        assert_eq!(settings.search.k, 8);
        // untouched sections keep their defaults
        assert_eq!(settings.store.collection, "learning_langchain");
        assert_eq!(settings.chunking.separators.len(), 4);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let err = Settings::from_toml(
            r#"
            [chunking]
            chunk_size = 100
            chunk_overlap = 100
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(Settings::from_toml("[search]\nk = 0\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfrag.toml");
        fs::write(
            &path,
            "[documents]\ndir = \"papers\"\nfiles = [\"a.pdf\"]\n\n[store]\ncollection = \"papers\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.documents.paths(), vec![PathBuf::from("papers/a.pdf")]);
        assert_eq!(settings.store.collection, "papers");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_redacted_toml_hides_keys() {
        let mut settings = Settings::default();
        settings.embedding.api_key = Some("sk-secret".into());

        let rendered = settings.to_redacted_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
        assert!(rendered.contains("learning_langchain"));
    }
}
