// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Missing credentials: every route serves the warning page

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use ragified::api::halted_router;
use ragified::api::render::{FOOD_SCANNER_TITLE, READER_TITLE};
use ragified::config::{FoodScannerConfig, ReaderConfig, SecretsStore};
use tower::ServiceExt;

fn no_env(_: &str) -> Option<String> {
    None
}

async fn send(router: axum::Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "multipart/form-data; boundary=x")
                .body(Body::from("--x--\r\n"))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_food_scanner_without_key_has_no_upload_control() {
    let err = FoodScannerConfig::from_sources(&SecretsStore::empty(), &no_env).unwrap_err();
    let router = halted_router(FOOD_SCANNER_TITLE, &err);

    for (method, uri) in [("GET", "/"), ("POST", "/analyze"), ("GET", "/health")] {
        let (status, html) = send(router.clone(), method, uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{} {}", method, uri);
        assert!(html.contains("OPENAI_API_KEY"));
        assert!(html.contains(r#"class="notice notice-warning""#));
        assert!(!html.contains("<form"));
        assert!(!html.contains(r#"type="file""#));
    }
}

#[tokio::test]
async fn test_malformed_openai_key_halts() {
    let lookup = |key: &str| (key == "OPENAI_API_KEY").then(|| "pk-not-openai".to_string());
    let err = FoodScannerConfig::from_sources(&SecretsStore::empty(), &lookup).unwrap_err();
    let (status, html) = send(halted_router(FOOD_SCANNER_TITLE, &err), "GET", "/").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(html.contains("OPENAI_API_KEY is invalid"));
}

#[tokio::test]
async fn test_reader_without_key_ignores_posts() {
    let err = ReaderConfig::from_sources(&SecretsStore::empty(), &no_env).unwrap_err();
    let router = halted_router(READER_TITLE, &err);

    for (method, uri) in [("POST", "/upload"), ("POST", "/ask"), ("POST", "/session/end")] {
        let (status, html) = send(router.clone(), method, uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(html.contains("GEMINI_API_KEY"));
        assert!(!html.contains("<form"));
    }
}
