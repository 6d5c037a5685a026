use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible embedding backend.
///
/// Talks to `{base_url}/v1/embeddings`. Every call is a single request; the
/// caller decides how many texts go into one batch.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    /// Sent as the `dimensions` request field when set
    requested_dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    /// Create an embedder for `model`.
    ///
    /// `dimensions` shortens the returned vectors on models that support it;
    /// models whose size is not known up front require it.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<String>,
        dimensions: Option<usize>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config(
                "an API key is required for the OpenAI embedder (set OPENAI_API_KEY)".into(),
            ));
        }

        let model = model.into();
        let dimension = match dimensions.or_else(|| known_dimension(&model)) {
            Some(d) => d,
            None => {
                return Err(Error::Config(format!(
                    "unknown embedding model '{model}', set embedding.dimensions"
                )))
            }
        };

        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            dimension,
            requested_dimensions: dimensions,
        })
    }

    /// Build from the `[embedding]` settings section.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone().unwrap_or_default(),
            config.model.clone(),
            Some(config.base_url.clone()),
            config.dimensions,
        )
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions,
        };

        tracing::debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let resp: EmbedResponse = response.json().await?;
        collect_embeddings(resp, texts.len(), self.dimension)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.request(texts).await
    }

    async fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        self.request(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("API returned no embeddings".to_string()))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

fn known_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-large" => Some(3072),
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

fn status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Authentication(format!("{status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(format!("{status}: {body}")),
        _ => Error::Embedding(format!("{status}: {body}")),
    }
}

fn collect_embeddings(
    mut resp: EmbedResponse,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Embedding>> {
    if resp.data.len() != expected {
        return Err(Error::Embedding(format!(
            "expected {expected} embeddings, got {}",
            resp.data.len()
        )));
    }

    // Sort by index to maintain input order.
    resp.data.sort_by_key(|item| item.index);

    let embeddings: Vec<Embedding> = resp.data.into_iter().map(|item| item.embedding).collect();

    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
        return Err(Error::Embedding(format!(
            "dimension mismatch: expected {dimension}, got {}",
            bad.len()
        )));
    }

    Ok(embeddings)
}
