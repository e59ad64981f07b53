// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AI Food Scanner HTTP handlers
//!
//! One photo per request: validate and re-encode it, send it to the vision
//! model with the nutrition prompt and render the answer under a preview.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::Multipart;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::errors::AppError;
use super::http_server::{read_upload_field, with_common_layers};
use super::render::{food_page, FoodView};
use crate::version::get_version_info;
use crate::vision::{prepare_image_within, EncodedImage, FoodAnalyzer, ImageFormatTag};

pub const UPLOAD_FIELD: &str = "food_image";

#[derive(Clone)]
pub struct FoodScannerState {
    pub analyzer: Arc<dyn FoodAnalyzer>,
    pub max_image_bytes: usize,
}

pub fn router(analyzer: Arc<dyn FoodAnalyzer>, max_upload_bytes: usize) -> Router {
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .with_state(FoodScannerState {
            analyzer,
            max_image_bytes: max_upload_bytes,
        });
    with_common_layers(app, max_upload_bytes)
}

async fn index_handler() -> Html<String> {
    Html(food_page(&FoodView::default()))
}

async fn health_handler(State(state): State<FoodScannerState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "app": "food-scanner",
        "version": get_version_info(),
        "model": state.analyzer.model_name(),
    }))
}

async fn analyze_handler(State(state): State<FoodScannerState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload_field(&mut multipart, UPLOAD_FIELD).await {
        Ok(upload) => upload,
        Err(e) => return error_page(None, e),
    };

    let mime = upload
        .content_type
        .clone()
        .or_else(|| ImageFormatTag::mime_from_filename(&upload.file_name).map(str::to_string))
        .unwrap_or_default();

    info!(
        "Analyzing {} ({}, {} bytes)",
        upload.file_name,
        mime,
        upload.bytes.len()
    );

    let max_bytes = state.max_image_bytes;
    let prepared =
        tokio::task::spawn_blocking(move || prepare_image_within(&upload.bytes, &mime, max_bytes)).await;
    let encoded = match prepared {
        Ok(Ok(encoded)) => encoded,
        Ok(Err(e)) => {
            warn!("Rejected upload: {}", e);
            return error_page(None, AppError::Validation(e));
        }
        Err(e) => {
            error!("Image encoding task failed: {}", e);
            return error_page(None, AppError::InternalError(e.to_string()));
        }
    };

    match state.analyzer.analyze(&encoded.base64, encoded.format.mime()).await {
        Ok(analysis) => Html(food_page(&FoodView {
            preview: Some(&encoded),
            analysis: Some(&analysis),
            notices: Vec::new(),
        }))
        .into_response(),
        Err(e) => {
            warn!("Analysis failed [{}]: {}", e.error_code(), e);
            error_page(Some(&encoded), AppError::openai(e))
        }
    }
}

fn error_page(preview: Option<&EncodedImage>, err: AppError) -> Response {
    let page = food_page(&FoodView {
        preview,
        analysis: None,
        notices: err.notices(),
    });
    (err.status_code(), Html(page)).into_response()
}
