// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text embeddings via the Gemini API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::upstream::{check_status, UpstreamError};

/// Largest batch accepted by `batchEmbedContents`
pub const MAX_EMBED_BATCH: usize = 100;

/// Turns text into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed document chunks, one vector per input, in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError>;

    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, UpstreamError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

/// Normalize a model id to the `models/...` resource name
pub fn model_resource(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Client for Gemini `embedContent` / `batchEmbedContents`
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let model = model_resource(model);
        info!("Embedder configured: base_url={}, model={}", base_url, model);
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, text: &'a str, task_type: &'static str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.model,
            content: Content {
                parts: vec![Part { text }],
            },
            task_type,
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &T,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/{}:{}", self.base_url, self.model, method))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;
        check_status(response).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| self.request(t, "RETRIEVAL_DOCUMENT"))
                .collect(),
        };
        let parsed: BatchEmbedResponse = self
            .post("batchEmbedContents", &body)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(UpstreamError::Unknown(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        if parsed.embeddings.iter().any(|e| e.values.is_empty()) {
            return Err(UpstreamError::EmptyResponse);
        }
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        let start = Instant::now();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_EMBED_BATCH) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        debug!(
            "Embedded {} chunks in {}ms",
            texts.len(),
            start.elapsed().as_millis()
        );
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let parsed: EmbedContentResponse = self
            .post("embedContent", &self.request(text, "RETRIEVAL_QUERY"))
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;
        parsed
            .embedding
            .map(|e| e.values)
            .filter(|v| !v.is_empty())
            .ok_or(UpstreamError::EmptyResponse)
    }
}

/// Cosine similarity between two vectors; 0.0 when undefined
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
