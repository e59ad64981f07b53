// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Failure taxonomy shared by every call to a hosted model API
//!
//! Both apps talk to third-party HTTP APIs (OpenAI for vision, Gemini for
//! embeddings and chat). Every call site returns [`UpstreamError`] so the
//! UI can render a specific message per failure mode instead of a generic
//! catch-all.

use reqwest::Response;
use thiserror::Error;

/// Message used when a non-2xx body carries no readable error message
pub const NO_MESSAGE_AVAILABLE: &str = "No message available";

/// Errors surfaced by hosted model clients
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// Network, DNS, TLS or timeout failure before a response arrived
    #[error("connection error: {0}")]
    Connection(String),

    /// The API answered with a non-2xx status
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The call succeeded but carried no text
    #[error("empty response from model")]
    EmptyResponse,

    /// Anything else (undecodable body, builder failure, ...)
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl UpstreamError {
    /// Classify a transport-level reqwest error
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            UpstreamError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            UpstreamError::Unknown(err.to_string())
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            UpstreamError::Connection(_) => "UPSTREAM_CONNECTION",
            UpstreamError::Status { .. } => "UPSTREAM_STATUS",
            UpstreamError::EmptyResponse => "UPSTREAM_EMPTY_RESPONSE",
            UpstreamError::Unknown(_) => "UPSTREAM_UNKNOWN",
        }
    }
}

/// Pull the human-readable message out of an API error body.
///
/// OpenAI and Gemini both use `{"error": {"message": "..."}}`.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| NO_MESSAGE_AVAILABLE.to_string())
}

/// Turn a non-success response into [`UpstreamError::Status`], pass others through
pub async fn check_status(resp: Response) -> Result<Response, UpstreamError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status,
        message: extract_error_message(&body),
    })
}
