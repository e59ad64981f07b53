// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Food scanner router exercised in-process

use crate::common::FakeAnalyzer;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use image::{ImageBuffer, ImageFormat, Rgb};
use ragified::api::food_scanner;
use ragified::upstream::UpstreamError;
use ragified::vision::FoodAnalyzer;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----ragified-test-boundary";

fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(8, 8, |x, _| Rgb([x as u8 * 30, 120, 60]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn app(analyzer: &Arc<FakeAnalyzer>) -> Router {
    food_scanner::router(Arc::clone(analyzer) as Arc<dyn FoodAnalyzer>, 1024 * 1024)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_shows_upload_form() {
    let analyzer = Arc::new(FakeAnalyzer::answering("unused"));
    let response = app(&analyzer)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("AI Food Image Scanner"));
    assert!(html.contains(r#"name="food_image""#));
}

#[tokio::test]
async fn test_png_upload_renders_preview_and_analysis() {
    let analyzer = Arc::new(FakeAnalyzer::answering("## Apple\n- **Calories:** 95 kcal"));
    let body = multipart_body("food_image", "apple.png", "image/png", &png_bytes());
    let response = app(&analyzer).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("<h2>Apple</h2>"));
    assert!(html.contains("<strong>Calories:</strong>"));
    assert_eq!(analyzer.calls(), 1);
}

#[tokio::test]
async fn test_gif_upload_never_reaches_analyzer() {
    let analyzer = Arc::new(FakeAnalyzer::answering("unused"));
    let gif = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";
    let body = multipart_body("food_image", "anim.gif", "image/gif", gif);
    let response = app(&analyzer).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let html = body_text(response).await;
    assert!(html.contains("Unsupported image format"));
    assert!(html.contains(r#"class="notice notice-error""#));
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn test_upstream_status_renders_error_and_warning() {
    let analyzer = Arc::new(FakeAnalyzer::failing(UpstreamError::Status {
        status: 401,
        message: "Incorrect API key provided".into(),
    }));
    let body = multipart_body("food_image", "apple.png", "image/png", &png_bytes());
    let response = app(&analyzer).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("OpenAI API Error: Status 401 - Incorrect API key provided"));
    assert!(html.contains(r#"class="notice notice-warning""#));
    // The preview is still shown
    assert!(html.contains("data:image/png;base64,"));
}

#[tokio::test]
async fn test_empty_response_renders_warning_only() {
    let analyzer = Arc::new(FakeAnalyzer::failing(UpstreamError::EmptyResponse));
    let body = multipart_body("food_image", "apple.png", "image/png", &png_bytes());
    let html = body_text(app(&analyzer).oneshot(upload_request(body)).await.unwrap()).await;
    assert!(html.contains("No analysis text received from the AI."));
    assert!(!html.contains(r#"class="notice notice-error""#));
}

#[tokio::test]
async fn test_upload_limit_comes_from_router_configuration() {
    let analyzer = Arc::new(FakeAnalyzer::answering("unused"));
    let png = png_bytes();
    let router = food_scanner::router(Arc::clone(&analyzer) as Arc<dyn FoodAnalyzer>, png.len() - 1);
    let body = multipart_body("food_image", "apple.png", "image/png", &png);
    let response = router.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_text(response).await.contains("too large"));
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn test_missing_file_field() {
    let analyzer = Arc::new(FakeAnalyzer::answering("unused"));
    let body = multipart_body("other", "apple.png", "image/png", &png_bytes());
    let response = app(&analyzer).oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn test_health() {
    let analyzer = Arc::new(FakeAnalyzer::answering("unused"));
    let response = app(&analyzer)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["app"], "food-scanner");
    assert_eq!(json["model"], "fake-vision");
}
