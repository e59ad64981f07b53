// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-visitor chat session over one uploaded document
//!
//! A session accepts exactly one document. While it is being indexed, or
//! once it is ready, further uploads are ignored. An indexing failure is
//! terminal; the visitor ends the session to start over.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{IndexingError, SessionError};
use super::models::ChatTurn;
use super::qa_chain::QaChain;

/// Lifecycle position of a session, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Indexing,
    Ready,
    IndexError,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Empty => "empty",
            SessionPhase::Indexing => "indexing",
            SessionPhase::Ready => "ready",
            SessionPhase::IndexError => "index_error",
        }
    }
}

pub enum SessionState {
    Empty,
    Indexing { document_name: String },
    Ready(QaChain),
    IndexError { document_name: String, message: String },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Empty => SessionPhase::Empty,
            SessionState::Indexing { .. } => SessionPhase::Indexing,
            SessionState::Ready(_) => SessionPhase::Ready,
            SessionState::IndexError { .. } => SessionPhase::IndexError,
        }
    }
}

/// Outcome of an upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDecision {
    /// The session moved to `Indexing`; the caller must run the pipeline
    /// and report back through [`ChatSession::complete_indexing`]
    Accepted,
    /// The session already has a document
    Ignored(SessionPhase),
}

pub struct ChatSession {
    id: String,
    state: SessionState,
    history: Vec<ChatTurn>,
    created_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: SessionState::Empty,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Answered questions, oldest first
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Name of the accepted document, if any
    pub fn document_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Indexing { document_name }
            | SessionState::IndexError { document_name, .. } => Some(document_name),
            SessionState::Ready(chain) => Some(chain.document_name()),
        }
    }

    /// Failure message when indexing failed
    pub fn index_error(&self) -> Option<&str> {
        match &self.state {
            SessionState::IndexError { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Claim the session for a new document. Only the first upload wins.
    pub fn try_begin_indexing(&mut self, document_name: &str) -> UploadDecision {
        match self.state {
            SessionState::Empty => {
                info!("Session {} indexing {}", self.id, document_name);
                self.state = SessionState::Indexing {
                    document_name: document_name.to_string(),
                };
                UploadDecision::Accepted
            }
            ref other => {
                debug!(
                    "Session {} ignoring upload of {} (state={})",
                    self.id,
                    document_name,
                    other.phase().as_str()
                );
                UploadDecision::Ignored(other.phase())
            }
        }
    }

    /// Record the pipeline outcome for an accepted upload
    pub fn complete_indexing(&mut self, outcome: Result<QaChain, IndexingError>) {
        let document_name = match &self.state {
            SessionState::Indexing { document_name } => document_name.clone(),
            other => {
                warn!(
                    "Session {} got indexing result in state {}",
                    self.id,
                    other.phase().as_str()
                );
                return;
            }
        };

        self.state = match outcome {
            Ok(chain) => {
                info!(
                    "Session {} ready: {} ({} chunks)",
                    self.id,
                    chain.document_name(),
                    chain.chunk_count()
                );
                SessionState::Ready(chain)
            }
            Err(e) => {
                warn!(
                    "Session {} indexing failed [{}]: {}",
                    self.id,
                    e.error_code(),
                    e
                );
                SessionState::IndexError {
                    document_name,
                    message: e.user_message(),
                }
            }
        };
    }

    /// Answer a question against the indexed document.
    ///
    /// The full history is passed as context. History is only extended on
    /// success.
    pub async fn ask(&mut self, question: &str) -> Result<&ChatTurn, SessionError> {
        let question = question.trim();
        let SessionState::Ready(chain) = &self.state else {
            return Err(SessionError::NotReady);
        };
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let answer = chain.answer(question, &self.history).await?;
        self.history.push(ChatTurn::new(question, answer));
        self.history.last().ok_or(SessionError::NotReady)
    }
}
