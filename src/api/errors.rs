// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mapping of every failure the apps can hit onto page notices and HTTP status

use axum::http::StatusCode;
use std::fmt;

use super::render::Notice;
use crate::config::ConfigError;
use crate::rag::{IndexingError, SessionError};
use crate::upstream::UpstreamError;
use crate::vision::ImageError;

/// Hosted API behind an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    OpenAi,
    Gemini,
}

impl Service {
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::OpenAi => "OpenAI",
            Service::Gemini => "Gemini",
        }
    }
}

#[derive(Debug, Clone)]
pub enum AppError {
    /// Credential missing or malformed; the app is halted
    ConfigurationMissing(ConfigError),
    /// The upload was rejected before any upstream call
    Validation(ImageError),
    /// Malformed form or multipart body
    InvalidRequest(String),
    Upstream {
        service: Service,
        error: UpstreamError,
    },
    Indexing(IndexingError),
    Session(SessionError),
    InternalError(String),
}

impl AppError {
    pub fn openai(error: UpstreamError) -> Self {
        AppError::Upstream {
            service: Service::OpenAi,
            error,
        }
    }

    pub fn gemini(error: UpstreamError) -> Self {
        AppError::Upstream {
            service: Service::Gemini,
            error,
        }
    }

    /// Notices rendered for this failure, in display order
    pub fn notices(&self) -> Vec<Notice> {
        match self {
            AppError::ConfigurationMissing(e) => vec![Notice::warning(e.to_string())],
            AppError::Validation(e) => vec![Notice::error(e.to_string())],
            AppError::InvalidRequest(msg) => vec![Notice::error(msg.clone())],
            AppError::Upstream { service, error } => upstream_notices(*service, error),
            AppError::Indexing(e) => vec![Notice::error(e.user_message())],
            AppError::Session(SessionError::Upstream(e)) => upstream_notices(Service::Gemini, e),
            AppError::Session(SessionError::NotReady) => vec![Notice::warning(
                "Please upload a PDF and wait for indexing to finish before asking questions.",
            )],
            AppError::Session(SessionError::EmptyQuestion) => {
                vec![Notice::warning("Please enter a question.")]
            }
            AppError::Session(e) => vec![Notice::error(e.to_string())],
            AppError::InternalError(msg) => vec![Notice::error(format!("Internal error: {}", msg))],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(ImageError::TooLarge(_, _)) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Validation(ImageError::UnsupportedFormat(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::Validation(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } | AppError::Session(SessionError::Upstream(_)) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Indexing(IndexingError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            AppError::Indexing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Session(SessionError::NotReady) => StatusCode::CONFLICT,
            AppError::Session(SessionError::EmptyQuestion) => StatusCode::BAD_REQUEST,
            AppError::Session(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::Upstream { error, .. } => error.error_code(),
            AppError::Indexing(e) => e.error_code(),
            AppError::Session(SessionError::Upstream(e)) => e.error_code(),
            AppError::Session(_) => "SESSION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error/warning pair for a failed hosted API call
pub fn upstream_notices(service: Service, error: &UpstreamError) -> Vec<Notice> {
    let name = service.display_name();
    match error {
        UpstreamError::Connection(details) => vec![
            Notice::error(format!(
                "{name} API Connection Error: Could not connect to the {name} API. Please check \
                 your internet connection or proxy settings. Details: {details}"
            )),
            Notice::warning(format!(
                "This usually means your app can't reach {name}'s servers."
            )),
        ],
        UpstreamError::Status { status, message } => vec![
            Notice::error(format!("{name} API Error: Status {status} - {message}")),
            Notice::warning(
                "Please check your API key, subscription status, or try again later. You might \
                 have exceeded your quota.",
            ),
        ],
        UpstreamError::EmptyResponse => match service {
            Service::OpenAi => vec![Notice::warning(
                "No analysis text received from the AI. The image might be unclear or the model \
                 had an issue.",
            )],
            Service::Gemini => vec![Notice::warning(
                "No answer text received from the AI. Try rephrasing your question.",
            )],
        },
        UpstreamError::Unknown(details) => match service {
            Service::OpenAi => vec![
                Notice::error(format!(
                    "An unexpected error occurred during AI analysis: {details}"
                )),
                Notice::warning(
                    "Please try uploading a different image or check your internet connection.",
                ),
            ],
            Service::Gemini => vec![
                Notice::error(format!(
                    "An unexpected error occurred while talking to {name}: {details}"
                )),
                Notice::warning("Please try again or check your internet connection."),
            ],
        },
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConfigurationMissing(e) => write!(f, "Configuration missing: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Upstream { service, error } => {
                write!(f, "{} upstream error: {}", service.display_name(), error)
            }
            AppError::Indexing(e) => write!(f, "Indexing error: {}", e),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::ConfigurationMissing(e)
    }
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        AppError::Validation(e)
    }
}

impl From<IndexingError> for AppError {
    fn from(e: IndexingError) -> Self {
        AppError::Indexing(e)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}
