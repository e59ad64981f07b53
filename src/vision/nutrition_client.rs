// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nutrition analysis via an OpenAI-compatible multimodal chat API

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::upstream::{check_status, UpstreamError};

use super::image_utils::data_url;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Instruction sent with every food photo
pub const NUTRITION_PROMPT: &str = concat!(
    "You are a certified food and nutrition expert. Analyze the food shown in this image and provide the following:\n",
    "- Food item name (if recognized)\n",
    "- Approximate calories (provide a range if unsure)\n",
    "- Macronutrients (Proteins, Carbs, Fats) in grams or percentage\n",
    "- Health benefits\n",
    "- Suitability for various diets (e.g., Keto, Vegan, Vegetarian, Diabetic, Gluten-Free, Low-Carb)\n",
    "- Pros and cons of consuming this food item\n",
    "Please provide the information in a clear, well-structured, and easy-to-read format, using bullet points or headings where appropriate."
);

/// Response length cap for one analysis
pub const MAX_ANALYSIS_TOKENS: u32 = 1000;

/// Anything that can turn an encoded food photo into an analysis
#[async_trait]
pub trait FoodAnalyzer: Send + Sync {
    /// Analyze a base64-encoded image of the given MIME type
    async fn analyze(&self, base64_image: &str, mime: &str) -> Result<String, UpstreamError>;

    /// Name of the model doing the analysis (for display)
    fn model_name(&self) -> &str;
}

/// Client for the OpenAI chat completions API with image input
pub struct OpenAiVisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model_name: String,
}

impl OpenAiVisionClient {
    pub fn new(base_url: &str, api_key: &str, model_name: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!(
            "Vision client configured: base_url={}, model={}",
            base_url, model_name
        );

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            model_name: model_name.to_string(),
        })
    }

    fn build_request(&self, base64_image: &str, mime: &str) -> ChatRequest {
        ChatRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "text", "text": NUTRITION_PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url(mime, base64_image)}}
                ]),
            }],
            max_tokens: MAX_ANALYSIS_TOKENS,
        }
    }
}

#[async_trait]
impl FoodAnalyzer for OpenAiVisionClient {
    async fn analyze(&self, base64_image: &str, mime: &str) -> Result<String, UpstreamError> {
        let start = Instant::now();
        let request = self.build_request(base64_image, mime);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;
        let response = check_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;
        let tokens_used = chat_response.usage.map(|u| u.total_tokens).unwrap_or(0);

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty());

        match text {
            Some(text) => {
                debug!(
                    "Analysis finished in {}ms ({} tokens)",
                    start.elapsed().as_millis(),
                    tokens_used
                );
                Ok(text)
            }
            None => {
                warn!("Vision model returned no analysis text");
                Err(UpstreamError::EmptyResponse)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
