// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload-to-index pipeline: extract, chunk, embed, store

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::chat_model::ChatModel;
use super::chunker::RecursiveCharacterSplitter;
use super::embeddings::Embedder;
use super::errors::IndexingError;
use super::models::LoadedDocument;
use super::pdf_loader::load_pdf_bytes;
use super::qa_chain::{QaChain, Retriever, DEFAULT_TOP_K};
use super::session_vector_store::SessionVectorStore;

/// Default vector capacity per session
pub const DEFAULT_MAX_VECTORS: usize = 100_000;

/// Builds a [`QaChain`] from an uploaded document
#[derive(Clone)]
pub struct IndexingPipeline {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    splitter: RecursiveCharacterSplitter,
    top_k: usize,
    max_vectors: usize,
}

impl IndexingPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            embedder,
            llm,
            splitter: RecursiveCharacterSplitter::default(),
            top_k: DEFAULT_TOP_K,
            max_vectors: DEFAULT_MAX_VECTORS,
        }
    }

    pub fn with_splitter(mut self, splitter: RecursiveCharacterSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_vectors(mut self, max_vectors: usize) -> Self {
        self.max_vectors = max_vectors;
        self
    }

    /// Index a PDF upload. Extraction runs on the blocking pool.
    pub async fn index_pdf(
        &self,
        session_id: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<QaChain, IndexingError> {
        let owned_name = name.to_string();
        let document = tokio::task::spawn_blocking(move || load_pdf_bytes(&owned_name, &bytes))
            .await
            .map_err(|e| {
                error!("PDF extraction task failed: {}", e);
                IndexingError::Extraction(format!("extractor crashed: {}", e))
            })??;
        self.index_document(session_id, document).await
    }

    /// Index already-extracted text
    pub async fn index_document(
        &self,
        session_id: &str,
        document: LoadedDocument,
    ) -> Result<QaChain, IndexingError> {
        let start = Instant::now();
        let chunks = self.splitter.split_document(&document.text);
        if chunks.is_empty() {
            return Err(IndexingError::EmptyDocument);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts).await?;

        let mut store = SessionVectorStore::new(session_id.to_string(), self.max_vectors);
        store
            .add_all(chunks, vectors)
            .map_err(|e| IndexingError::Store(e.to_string()))?;

        info!(
            "Indexed {} into {} chunks for session {} in {}ms",
            document.name,
            store.count(),
            session_id,
            start.elapsed().as_millis()
        );

        let retriever = Retriever::new(store, Arc::clone(&self.embedder), self.top_k);
        Ok(QaChain::new(retriever, Arc::clone(&self.llm), document.name))
    }
}
