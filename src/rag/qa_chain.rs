// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversational question answering over an indexed document
//!
//! A follow-up question is first rewritten into a standalone question using
//! the chat history. The standalone question retrieves the top-k chunks,
//! which are stuffed into a single answer prompt.

use std::sync::Arc;
use tracing::debug;

use super::chat_model::ChatModel;
use super::embeddings::Embedder;
use super::errors::SessionError;
use super::models::ChatTurn;
use super::session_vector_store::{SearchResult, SessionVectorStore};

/// Chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 10;

/// Similarity search over one session's vector store
pub struct Retriever {
    store: SessionVectorStore,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(store: SessionVectorStore, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { store, embedder, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn chunk_count(&self) -> usize {
        self.store.count()
    }

    /// Top-k chunks for a query, most similar first
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, SessionError> {
        let vector = self.embedder.embed_query(query).await?;
        self.store
            .search(&vector, self.k)
            .map_err(|e| SessionError::Retrieval(e.to_string()))
    }
}

/// Render history as alternating Human/Assistant lines
pub fn format_chat_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("\nHuman: {}\nAssistant: {}", turn.question(), turn.answer()))
        .collect()
}

pub fn condense_question_prompt(history: &[ChatTurn], question: &str) -> String {
    format!(
        "Given the following conversation and a follow up question, rephrase the follow up \
         question to be a standalone question, in its original language.\n\n\
         Chat History:\n{}\nFollow Up Input: {}\nStandalone question:",
        format_chat_history(history),
        question
    )
}

pub fn answer_prompt(context: &[SearchResult], question: &str) -> String {
    let context = context
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Use the following pieces of context to answer the question at the end. If you don't \
         know the answer, just say that you don't know, don't try to make up an answer.\n\n\
         {}\n\nQuestion: {}\nHelpful Answer:",
        context, question
    )
}

/// Retriever plus chat model; one per indexed document
pub struct QaChain {
    retriever: Retriever,
    llm: Arc<dyn ChatModel>,
    document_name: String,
}

impl std::fmt::Debug for QaChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaChain")
            .field("document_name", &self.document_name)
            .finish_non_exhaustive()
    }
}

impl QaChain {
    pub fn new(retriever: Retriever, llm: Arc<dyn ChatModel>, document_name: String) -> Self {
        Self {
            retriever,
            llm,
            document_name,
        }
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub fn chunk_count(&self) -> usize {
        self.retriever.chunk_count()
    }

    /// Answer a question given the turns answered so far
    pub async fn answer(&self, question: &str, history: &[ChatTurn]) -> Result<String, SessionError> {
        let standalone = if history.is_empty() {
            question.to_string()
        } else {
            let rewritten = self
                .llm
                .complete(&condense_question_prompt(history, question))
                .await?;
            debug!("Condensed follow-up into: {}", rewritten.trim());
            rewritten.trim().to_string()
        };

        let context = self.retriever.retrieve(&standalone).await?;
        debug!(
            "Retrieved {} chunks for question (k={})",
            context.len(),
            self.retriever.k()
        );

        let answer = self.llm.complete(&answer_prompt(&context, &standalone)).await?;
        Ok(answer.trim().to_string())
    }
}
