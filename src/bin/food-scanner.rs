// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use ragified::{
    api::{food_scanner, halted_router, render::FOOD_SCANNER_TITLE, serve},
    config::{redact, FoodScannerConfig},
    version,
    vision::OpenAiVisionClient,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting {}", version::get_version_string("food-scanner"));

    let (router, addr) = match FoodScannerConfig::from_env() {
        Ok(config) => {
            info!(
                "Using OpenAI key {} with model {}",
                redact(&config.openai_api_key),
                config.vision_model
            );
            let analyzer = OpenAiVisionClient::new(
                &config.openai_base_url,
                &config.openai_api_key,
                &config.vision_model,
            )?;
            (
                food_scanner::router(Arc::new(analyzer), config.max_upload_bytes),
                config.listen_addr,
            )
        }
        Err(e) => (
            halted_router(FOOD_SCANNER_TITLE, &e),
            FoodScannerConfig::listen_addr_from_env(),
        ),
    };

    serve(router, addr, "Food scanner").await
}
