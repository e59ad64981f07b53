// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use ragified::{
    api::{halted_router, reader, render::READER_TITLE, serve, ReaderState, SessionStore, SessionStoreConfig},
    config::{redact, ReaderConfig},
    rag::{GeminiChat, GeminiEmbedder, IndexingPipeline},
    version,
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

    info!("Starting {}", version::get_version_string("ragified-reader"));

    let config = match ReaderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let router = halted_router(READER_TITLE, &e);
            return serve(router, ReaderConfig::listen_addr_from_env(), "RAGified Reader").await;
        }
    };

    info!(
        "Using Gemini key {} (chat={}, embeddings={})",
        redact(&config.gemini_api_key),
        config.chat_model,
        config.embedding_model
    );

    let embedder = GeminiEmbedder::new(
        &config.gemini_base_url,
        &config.gemini_api_key,
        &config.embedding_model,
    )?;
    let chat = GeminiChat::new(
        &config.gemini_base_url,
        &config.gemini_api_key,
        &config.chat_model,
    )?;
    let pipeline = IndexingPipeline::new(Arc::new(embedder), Arc::new(chat));

    let sessions = SessionStore::new(SessionStoreConfig {
        max_sessions: config.max_sessions,
        idle_timeout: config.session_idle_timeout,
        ..SessionStoreConfig::default()
    });
    let _cleanup = sessions.spawn_cleanup_task();

    let state = ReaderState {
        pipeline: Arc::new(pipeline),
        sessions,
    };

    serve(
        reader::router(state, config.max_upload_bytes),
        config.listen_addr,
        "RAGified Reader",
    )
    .await
}
