// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! RAGified Reader HTTP handlers
//!
//! Each browser gets a session cookie. The session indexes the first PDF it
//! receives and then answers questions about it, keeping the chat history.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, Multipart,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::errors::AppError;
use super::http_server::{read_upload_field, with_common_layers};
use super::render::{reader_page, Notice, ReaderView, INDEXED_MESSAGE};
use super::session_store::{SessionStore, SharedSession};
use crate::rag::{pdf_loader::looks_like_pdf, ChatSession, IndexingError, IndexingPipeline, UploadDecision};
use crate::version::get_version_info;

pub const SESSION_COOKIE: &str = "ragified_session";
pub const UPLOAD_FIELD: &str = "document";

#[derive(Clone)]
pub struct ReaderState {
    pub pipeline: Arc<IndexingPipeline>,
    pub sessions: SessionStore,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

pub fn router(state: ReaderState, max_upload_bytes: usize) -> Router {
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/ask", post(ask_handler))
        .route("/session/end", post(end_session_handler))
        .route("/health", get(health_handler))
        .with_state(state);
    with_common_layers(app, max_upload_bytes)
}

fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Resolve the visitor's session, creating one when the cookie is absent or stale
async fn resolve_session(state: &ReaderState, jar: CookieJar) -> (CookieJar, String, SharedSession) {
    let cookie_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let (id, session) = state.sessions.get_or_create(cookie_id.as_deref()).await;
    let jar = if cookie_id.as_deref() == Some(id.as_str()) {
        jar
    } else {
        jar.add(session_cookie(&id))
    };
    (jar, id, session)
}

fn render_session(session: &ChatSession, notices: Vec<Notice>) -> String {
    reader_page(&ReaderView {
        phase: session.phase(),
        document_name: session.document_name(),
        index_error: session.index_error(),
        history: session.history(),
        notices,
    })
}

async fn index_handler(State(state): State<ReaderState>, jar: CookieJar) -> Response {
    let (jar, _, session) = resolve_session(&state, jar).await;
    let session = session.lock().await;
    (jar, Html(render_session(&session, Vec::new()))).into_response()
}

async fn upload_handler(
    State(state): State<ReaderState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, session_id, session) = resolve_session(&state, jar).await;

    let upload = match read_upload_field(&mut multipart, UPLOAD_FIELD).await {
        Ok(upload) => upload,
        Err(e) => return page_with_error(jar, &session, e).await,
    };
    if !looks_like_pdf(&upload.bytes) {
        let err = IndexingError::InvalidDocument(format!("{} is not a PDF", upload.file_name));
        return page_with_error(jar, &session, AppError::Indexing(err)).await;
    }

    let document_name = if upload.file_name.is_empty() {
        "document.pdf".to_string()
    } else {
        upload.file_name.clone()
    };

    // Claim under the lock, index without it, report back under it
    let decision = session.lock().await.try_begin_indexing(&document_name);
    if let UploadDecision::Ignored(phase) = decision {
        debug!("Upload ignored for session {} in phase {}", session_id, phase.as_str());
        let session = session.lock().await;
        return (jar, Html(render_session(&session, Vec::new()))).into_response();
    }

    // The task owns the session, so Indexing is resolved even if this request is dropped
    let indexing = spawn_indexing(
        Arc::clone(&state.pipeline),
        Arc::clone(&session),
        session_id.clone(),
        document_name,
        upload.bytes,
    );
    let status = match indexing.await {
        Ok(status) => status,
        Err(e) => {
            error!("Indexing task for session {} failed: {}", session_id, e);
            session
                .lock()
                .await
                .complete_indexing(Err(IndexingError::Extraction(format!(
                    "indexing task failed: {}",
                    e
                ))));
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let notices = if status == StatusCode::OK {
        vec![Notice::success(INDEXED_MESSAGE)]
    } else {
        Vec::new()
    };

    let session = session.lock().await;
    (status, jar, Html(render_session(&session, notices))).into_response()
}

/// Run the pipeline and record its outcome on the session. Returns the page status.
fn spawn_indexing(
    pipeline: Arc<IndexingPipeline>,
    session: SharedSession,
    session_id: String,
    document_name: String,
    bytes: Vec<u8>,
) -> JoinHandle<StatusCode> {
    tokio::spawn(async move {
        let outcome = pipeline.index_pdf(&session_id, &document_name, bytes).await;
        let status = match &outcome {
            Ok(_) => StatusCode::OK,
            Err(e) => AppError::Indexing(e.clone()).status_code(),
        };
        session.lock().await.complete_indexing(outcome);
        status
    })
}

async fn ask_handler(
    State(state): State<ReaderState>,
    jar: CookieJar,
    Form(form): Form<AskForm>,
) -> Response {
    let (jar, session_id, session) = resolve_session(&state, jar).await;

    // Held across the answer so one session's questions are answered in order
    let mut session = session.lock().await;
    let outcome = session
        .ask(&form.question)
        .await
        .map(|turn| turn.answer().len());
    match outcome {
        Ok(answer_len) => {
            info!(
                "Session {} answered question ({} chars)",
                session_id, answer_len
            );
            (jar, Html(render_session(&session, Vec::new()))).into_response()
        }
        Err(e) => {
            let err = AppError::Session(e);
            warn!("Session {} ask failed [{}]: {}", session_id, err.error_code(), err);
            (
                err.status_code(),
                jar,
                Html(render_session(&session, err.notices())),
            )
                .into_response()
        }
    }
}

async fn end_session_handler(State(state): State<ReaderState>, jar: CookieJar) -> Response {
    if let Some(id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        if state.sessions.destroy(&id).await {
            info!("Session {} ended", id);
        }
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/")).into_response()
}

async fn health_handler(State(state): State<ReaderState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "app": "ragified-reader",
        "version": get_version_info(),
        "sessions": state.sessions.session_count().await,
    }))
}

async fn page_with_error(jar: CookieJar, session: &SharedSession, err: AppError) -> Response {
    warn!("Upload rejected [{}]: {}", err.error_code(), err);
    let session = session.lock().await;
    (
        err.status_code(),
        jar,
        Html(render_session(&session, err.notices())),
    )
        .into_response()
}
