//! Deterministic stand-ins for network collaborators.

use async_trait::async_trait;

use crate::embed::{Embedder, Embedding};
use crate::Result;

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Records the size of every batch it is asked to embed.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    pub batches: Vec<usize>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            batches: Vec::new(),
        }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let text = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|word| text.matches(word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.batches.push(texts.len());
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    async fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        Ok(self.embed_one(text))
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}
