use std::collections::HashMap;

use async_trait::async_trait;

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::store::{check_pairs, SearchResult, VectorStore};
use crate::Result;

/// In-memory vector store for development and testing.
///
/// Uses brute-force cosine similarity search. Suitable for small datasets
/// (< 10k chunks). Entries keep their insertion order, so equal scores are
/// returned in the order the chunks were ingested.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<(Chunk, Embedding)>,
    positions: HashMap<String, usize>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        check_pairs(chunks, embeddings)?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let entry = (chunk.clone(), embedding.clone());
            match self.positions.get(&chunk.id) {
                Some(&i) => self.entries[i] = entry,
                None => {
                    self.positions.insert(chunk.id.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
        Ok(())
    }

    async fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query, embedding),
            })
            .collect();

        // stable sort keeps insertion order for ties
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.positions.clear();
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
