use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::chunk::{Chunk, ChunkMetadata};
use crate::config::StoreConfig;
use crate::embed::Embedding;
use crate::store::{check_pairs, SearchResult, VectorStore};
use crate::{Error, Result};

/// Vector store backed by a Qdrant collection, over its REST API.
///
/// Points are stored with the payload layout
/// `{ "page_content": ..., "metadata": {...}, "chunk_id": ... }`, and the
/// point id is the chunk id read as a `u64`.
///
/// The collection is created on the first insert (cosine distance, sized to
/// the first embedding). Searching a collection that does not exist is an
/// error rather than an empty result.
pub struct QdrantStore {
    client: Client,
    url: String,
    collection: String,
    api_key: Option<String>,
    /// Set once the collection is known to exist
    ready: bool,
}

impl QdrantStore {
    pub fn new(
        url: impl Into<String>,
        collection: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key,
            ready: false,
        })
    }

    /// Build from the `[store]` settings section.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.collection.clone(), config.api_key.clone())
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/collections/{}{}", self.url, self.collection, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    pub async fn collection_exists(&self) -> Result<bool> {
        let response = self
            .authorize(self.client.get(self.endpoint("")))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(store_error(response).await),
        }
    }

    async fn ensure_collection(&mut self, dimension: usize) -> Result<()> {
        if self.ready {
            return Ok(());
        }

        if !self.collection_exists().await? {
            tracing::info!(collection = %self.collection, dimension, "creating collection");
            let body = json!({ "vectors": { "size": dimension, "distance": "Cosine" } });
            let response = self
                .authorize(self.client.put(self.endpoint("")).json(&body))
                .send()
                .await?;
            check(response).await?;
        }

        self.ready = true;
        Ok(())
    }

    fn missing_collection(&self) -> Error {
        Error::NotFound(format!("collection '{}'", self.collection))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        check_pairs(chunks, embeddings)?;
        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        self.ensure_collection(first.len()).await?;

        let points = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Point::new(chunk, embedding))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(collection = %self.collection, points = points.len(), "upserting");

        let response = self
            .authorize(
                self.client
                    .put(self.endpoint("/points?wait=true"))
                    .json(&json!({ "points": points })),
            )
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn search(&self, query_embedding: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        let body = json!({
            "vector": query_embedding,
            "limit": k,
            "with_payload": true,
        });
        let response = self
            .authorize(self.client.post(self.endpoint("/points/search")).json(&body))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(self.missing_collection());
        }
        let response = check(response).await?;
        let hits: QdrantResponse<Vec<ScoredPoint>> = response.json().await?;

        hits.result.into_iter().map(ScoredPoint::into_result).collect()
    }

    async fn len(&self) -> Result<usize> {
        let response = self
            .authorize(
                self.client
                    .post(self.endpoint("/points/count"))
                    .json(&json!({ "exact": true })),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(self.missing_collection());
        }
        let response = check(response).await?;
        let count: QdrantResponse<CountResult> = response.json().await?;
        Ok(count.result.count)
    }

    async fn clear(&mut self) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.endpoint("")))
            .send()
            .await?;
        check(response).await?;
        self.ready = false;
        Ok(())
    }
}

/// A point as sent to `PUT /collections/{name}/points`
#[derive(Debug, Serialize)]
struct Point<'a> {
    id: u64,
    vector: &'a [f32],
    payload: Payload,
}

impl<'a> Point<'a> {
    fn new(chunk: &Chunk, vector: &'a [f32]) -> Result<Self> {
        let id = u64::from_str_radix(&chunk.id, 16).map_err(|_| {
            Error::InvalidInput(format!("chunk id '{}' is not a hex u64", chunk.id))
        })?;

        Ok(Self {
            id,
            vector,
            payload: Payload {
                page_content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                chunk_id: Some(chunk.id.clone()),
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    page_content: String,
    #[serde(default)]
    metadata: ChunkMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chunk_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    payload: Option<Payload>,
}

impl ScoredPoint {
    fn into_result(self) -> Result<SearchResult> {
        let payload = self
            .payload
            .ok_or_else(|| Error::Store(format!("point {} has no payload", self.id)))?;

        // points written by other tools may lack our id field
        let id = payload.chunk_id.unwrap_or_else(|| match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Ok(SearchResult {
            chunk: Chunk {
                id,
                content: payload.page_content,
                metadata: payload.metadata,
            },
            score: self.score,
        })
    }
}

async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(store_error(response).await)
    }
}

async fn store_error(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::Store(format!("qdrant returned {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;

    fn chunk() -> Chunk {
        let mut extra = Metadata::new();
        extra.insert("source".into(), json!("PDFs/BERT.pdf"));
        extra.insert("page".into(), json!(2));
        Chunk {
            id: "00000000000000ff".into(),
            content: "BERT is a bidirectional encoder.".into(),
            metadata: ChunkMetadata {
                position: 1,
                start_index: 800,
                total_chunks: Some(3),
                extra,
            },
        }
    }

    #[test]
    fn test_endpoint_paths() {
        let store = QdrantStore::new("http://localhost:6333/", "learning_langchain", None).unwrap();

        assert_eq!(
            store.endpoint("/points/search"),
            "http://localhost:6333/collections/learning_langchain/points/search"
        );
        assert_eq!(
            store.endpoint(""),
            "http://localhost:6333/collections/learning_langchain"
        );
    }

    #[test]
    fn test_point_layout() {
        let chunk = chunk();
        let vector = vec![0.5, 0.25];
        let value = serde_json::to_value(Point::new(&chunk, &vector).unwrap()).unwrap();

        assert_eq!(value["id"], json!(255));
        assert_eq!(value["vector"], json!([0.5, 0.25]));
        assert_eq!(value["payload"]["page_content"], json!(chunk.content));
        assert_eq!(value["payload"]["metadata"]["source"], json!("PDFs/BERT.pdf"));
        assert_eq!(value["payload"]["metadata"]["start_index"], json!(800));
        assert_eq!(value["payload"]["chunk_id"], json!("00000000000000ff"));
    }

    #[test]
    fn test_point_rejects_non_hex_id() {
        let mut chunk = chunk();
        chunk.id = "not-hex".into();
        assert!(Point::new(&chunk, &[1.0]).is_err());
    }

    #[test]
    fn test_parse_search_response() {
        let raw = json!({
            "result": [
                {
                    "id": 255,
                    "version": 3,
                    "score": 0.87,
                    "payload": {
                        "page_content": "Attention is all you need",
                        "metadata": {"source": "PDFs/Attention_is_all_you_need.pdf", "page": 0,
                                     "position": 0, "start_index": 0, "total_chunks": 4},
                        "chunk_id": "00000000000000ff"
                    }
                },
                {
                    "id": "5c56c793-69f3-4fbf-87e6-c4bf54c28c26",
                    "score": 0.5,
                    "payload": {"page_content": "written elsewhere", "metadata": {"page": 7}}
                }
            ],
            "status": "ok",
            "time": 0.001
        });

        let hits: QdrantResponse<Vec<ScoredPoint>> = serde_json::from_value(raw).unwrap();
        let results: Vec<SearchResult> = hits
            .result
            .into_iter()
            .map(ScoredPoint::into_result)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "00000000000000ff");
        assert_eq!(results[0].chunk.metadata.total_chunks, Some(4));
        assert_eq!(
            results[0].chunk.metadata.source(),
            Some("PDFs/Attention_is_all_you_need.pdf")
        );
        assert!((results[0].score - 0.87).abs() < 1e-6);

        assert_eq!(results[1].chunk.id, "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
        assert_eq!(results[1].chunk.metadata.get("page"), Some(&json!(7)));
    }

    #[test]
    fn test_missing_payload_is_error() {
        let point: ScoredPoint =
            serde_json::from_value(json!({"id": 1, "score": 0.1})).unwrap();
        assert!(matches!(point.into_result(), Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_insert_nothing_is_noop() {
        // no request is made, so no server is needed
        let mut store = QdrantStore::new("http://127.0.0.1:9", "unused", None).unwrap();
        store.insert(&[], &[]).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires a Qdrant instance on localhost:6333
    async fn test_roundtrip_against_qdrant() {
        let mut store = QdrantStore::new("http://localhost:6333", "pdfrag_test", None).unwrap();
        let _ = store.clear().await;

        store.insert(&[chunk()], &[vec![1.0, 0.0]]).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);

        let results = store.search(&vec![1.0, 0.0], 4).await.unwrap();
        assert_eq!(results[0].chunk, chunk());

        store.clear().await.unwrap();
        assert!(matches!(store.len().await, Err(Error::NotFound(_))));
    }
}
