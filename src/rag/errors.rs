// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for document indexing and chat sessions

use thiserror::Error;

use crate::upstream::UpstreamError;

/// Errors that can occur while turning an upload into a searchable index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexingError {
    /// The upload is not a PDF
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Text extraction failed
    #[error("Failed to extract text: {0}")]
    Extraction(String),

    /// The PDF contains no extractable text
    #[error("The document contains no extractable text")]
    EmptyDocument,

    /// Embedding API failure
    #[error("Embedding failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// Vector store rejected the embeddings
    #[error("Failed to build index: {0}")]
    Store(String),

    /// Temporary file handling failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IndexingError {
    fn from(err: std::io::Error) -> Self {
        IndexingError::Io(err.to_string())
    }
}

impl IndexingError {
    /// Get user-friendly error message for the UI
    pub fn user_message(&self) -> String {
        match self {
            IndexingError::InvalidDocument(_) => {
                "The uploaded file is not a readable PDF.".to_string()
            }
            IndexingError::EmptyDocument => {
                "No text could be extracted from this PDF (is it a scanned image?).".to_string()
            }
            IndexingError::Upstream(UpstreamError::Status { status, message }) => {
                format!("Gemini API Error: Status {} - {}", status, message)
            }
            IndexingError::Upstream(UpstreamError::Connection(_)) => {
                "Could not connect to the Gemini API while indexing.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            IndexingError::InvalidDocument(_) => "INVALID_DOCUMENT",
            IndexingError::Extraction(_) => "EXTRACTION_FAILED",
            IndexingError::EmptyDocument => "EMPTY_DOCUMENT",
            IndexingError::Upstream(_) => "EMBEDDING_FAILED",
            IndexingError::Store(_) => "INDEX_BUILD_FAILED",
            IndexingError::Io(_) => "IO_ERROR",
        }
    }
}

/// Errors returned when asking a question
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// No document has been indexed in this session (or indexing failed)
    #[error("No document is ready for questions")]
    NotReady,

    #[error("Question is empty")]
    EmptyQuestion,

    /// Similarity search failed
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
