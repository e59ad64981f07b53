// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// Session-scoped document indexing and conversational question answering

pub mod chat_model;
pub mod chunker;
pub mod embeddings;
pub mod errors;
pub mod indexer;
pub mod models;
pub mod pdf_loader;
pub mod qa_chain;
pub mod session;
pub mod session_vector_store;

pub use chat_model::{ChatModel, GeminiChat};
pub use chunker::RecursiveCharacterSplitter;
pub use embeddings::{Embedder, GeminiEmbedder};
pub use errors::{IndexingError, SessionError};
pub use indexer::IndexingPipeline;
pub use models::{ChatTurn, DocumentChunk, LoadedDocument};
pub use qa_chain::{QaChain, Retriever};
pub use session::{ChatSession, SessionPhase, SessionState, UploadDecision};
pub use session_vector_store::{SearchResult, SessionVectorStore, VectorEntry};
