// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text generation via the Gemini `generateContent` API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::upstream::{check_status, UpstreamError};

use super::embeddings::model_resource;

/// Sampling temperature used for answers
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A single-prompt text completion model
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

pub struct GeminiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiChat {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let model = model_resource(model);
        info!("Chat model configured: base_url={}, model={}", base_url, model);
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            model,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

fn first_candidate_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;
        let parsed: GenerateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;

        match first_candidate_text(parsed) {
            Some(text) => {
                debug!("Generated {} chars in {}ms", text.len(), start.elapsed().as_millis());
                Ok(text)
            }
            None => {
                warn!("Chat model returned no candidate text");
                Err(UpstreamError::EmptyResponse)
            }
        }
    }
}
