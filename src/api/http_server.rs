// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router plumbing shared by both apps

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use axum_extra::extract::Multipart;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::errors::AppError;
use super::render::halted_page;
use crate::config::ConfigError;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// A file pulled out of a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read the named file field from a multipart body.
///
/// A missing field or a field with no content is an `InvalidRequest`.
pub async fn read_upload_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read file data: {}", e)))?
            .to_vec();
        if bytes.is_empty() {
            break;
        }
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::InvalidRequest(format!(
        "No file uploaded. Use the '{}' field.",
        field_name
    )))
}

/// Body limits and request tracing applied to every app router
pub fn with_common_layers(router: Router, max_upload_bytes: usize) -> Router {
    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct HaltedState {
    title: &'static str,
    warning: Arc<String>,
}

async fn halted_handler(State(state): State<HaltedState>) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(halted_page(state.title, &state.warning)),
    )
        .into_response()
}

/// Router used when a credential is missing: every route returns the
/// warning page and no handler does any work.
pub fn halted_router(title: &'static str, error: &ConfigError) -> Router {
    warn!("Configuration error, serving warning page only: {}", error);
    Router::new()
        .fallback(halted_handler)
        .with_state(HaltedState {
            title,
            warning: Arc::new(error.to_string()),
        })
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(router: Router, addr: SocketAddr, app_name: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("{} listening on http://{}", app_name, listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
