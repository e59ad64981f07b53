// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Reader router exercised in-process with fake Gemini models

use crate::common::{minimal_pdf, pipeline, ready_chain, FakeChat, FakeEmbedder, GatedEmbedder};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use ragified::api::reader::{self, ReaderState, SESSION_COOKIE};
use ragified::api::{SessionStore, SessionStoreConfig};
use ragified::api::render::INDEXED_MESSAGE;
use ragified::api::session_store::SharedSession;
use ragified::rag::{ChatModel, Embedder, IndexingPipeline, SessionPhase, UploadDecision};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct Harness {
    embedder: Arc<FakeEmbedder>,
    chat: Arc<FakeChat>,
    sessions: SessionStore,
    router: Router,
}

fn harness() -> Harness {
    let embedder = Arc::new(FakeEmbedder::default());
    let chat = Arc::new(FakeChat::default());
    let sessions = SessionStore::new(SessionStoreConfig::default());
    let state = ReaderState {
        pipeline: Arc::new(pipeline(&embedder, &chat)),
        sessions: sessions.clone(),
    };
    Harness {
        embedder,
        chat,
        sessions,
        router: reader::router(state, 1024 * 1024),
    }
}

/// A session that already has the sample document indexed
async fn ready_session_id(h: &Harness) -> String {
    let (id, session) = h.sessions.get_or_create(None).await;
    let chain = ready_chain(&h.embedder, &h.chat).await;
    let mut session = session.lock().await;
    assert_eq!(session.try_begin_indexing("rust.pdf"), UploadDecision::Accepted);
    session.complete_indexing(Ok(chain));
    id
}

fn cookie(id: &str) -> String {
    format!("{}={}", SESSION_COOKIE, id)
}

fn ask_request(session_id: &str, question: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::COOKIE, cookie(session_id))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("question={}", question.replace(' ', "+"))))
        .unwrap()
}

fn upload_request(session_id: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--b0undary\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
        file_name
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n--b0undary--\r\n");
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::COOKIE, cookie(session_id))
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=b0undary")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_first_visit_sets_cookie_and_shows_upload() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(set_cookie.contains("HttpOnly"));

    let html = body_text(response).await;
    assert!(html.contains(r#"action="/upload""#));
    assert!(html.contains("No questions yet."));
    assert_eq!(h.sessions.session_count().await, 1);
}

#[tokio::test]
async fn test_ask_appends_turn_and_updates_sidebar() {
    let h = harness();
    let id = ready_session_id(&h).await;

    let response = h
        .router
        .clone()
        .oneshot(ask_request(&id, "What is Tokio"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Known cookie is not re-issued
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains("What is Tokio"));
    assert!(html.contains("reply 1"));
    assert!(html.contains("1. What is Tokio..."));

    let session = h.sessions.get(&id).await.unwrap();
    assert_eq!(session.lock().await.history().len(), 1);
}

#[tokio::test]
async fn test_questions_answered_in_order() {
    let h = harness();
    let id = ready_session_id(&h).await;

    for q in ["first question", "second question", "third question"] {
        let response = h.router.clone().oneshot(ask_request(&id, q)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let session = h.sessions.get(&id).await.unwrap();
    let session = session.lock().await;
    let questions: Vec<&str> = session.history().iter().map(|t| t.question()).collect();
    assert_eq!(questions, vec!["first question", "second question", "third question"]);
}

#[tokio::test]
async fn test_ask_before_upload_is_conflict() {
    let h = harness();
    let (id, _) = h.sessions.get_or_create(None).await;
    let response = h.router.clone().oneshot(ask_request(&id, "hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let html = body_text(response).await;
    assert!(html.contains("Please upload a PDF"));
    assert!(h.chat.prompts().is_empty());
}

#[tokio::test]
async fn test_second_upload_when_ready_changes_nothing() {
    let h = harness();
    let id = ready_session_id(&h).await;
    h.router.clone().oneshot(ask_request(&id, "What is Rust")).await.unwrap();
    let embed_calls = h.embedder.document_calls();

    let response = h
        .router
        .clone()
        .oneshot(upload_request(&id, "other.pdf", b"%PDF-1.4 another document"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session = h.sessions.get(&id).await.unwrap();
    let session = session.lock().await;
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert_eq!(session.document_name(), Some("rust.pdf"));
    assert_eq!(session.history().len(), 1);
    assert_eq!(h.embedder.document_calls(), embed_calls);
}

#[tokio::test]
async fn test_non_pdf_upload_keeps_session_empty() {
    let h = harness();
    let (id, _) = h.sessions.get_or_create(None).await;

    let response = h
        .router
        .clone()
        .oneshot(upload_request(&id, "notes.txt", b"just text"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("not a readable PDF"));
    assert!(html.contains(r#"action="/upload""#));

    let session = h.sessions.get(&id).await.unwrap();
    assert_eq!(session.lock().await.phase(), SessionPhase::Empty);
}

#[tokio::test]
async fn test_end_session_clears_state() {
    let h = harness();
    let id = ready_session_id(&h).await;

    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/session/end")
                .header(header::COOKIE, cookie(&id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    assert!(h.sessions.get(&id).await.is_none());
}

#[tokio::test]
async fn test_health_reports_sessions() {
    let h = harness();
    h.sessions.get_or_create(None).await;
    let response = h
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["app"], "ragified-reader");
    assert_eq!(json["sessions"], 1);
}

async fn wait_for_phase(session: &SharedSession, wanted: SessionPhase) {
    for _ in 0..500 {
        if session.lock().await.phase() == wanted {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "session stayed in {:?}, expected {:?}",
        session.lock().await.phase(),
        wanted
    );
}

#[tokio::test]
async fn test_pdf_upload_indexes_then_answers() {
    let h = harness();
    let (id, session) = h.sessions.get_or_create(None).await;

    let response = h
        .router
        .clone()
        .oneshot(upload_request(
            &id,
            "recipe.pdf",
            &minimal_pdf("Knead the dough for ten minutes"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(INDEXED_MESSAGE));
    assert!(html.contains("recipe.pdf"));
    assert!(html.contains(r#"action="/ask""#));
    assert_eq!(session.lock().await.phase(), SessionPhase::Ready);
    assert_eq!(h.embedder.document_calls(), 1);

    let response = h
        .router
        .clone()
        .oneshot(ask_request(&id, "How long to knead"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = session.lock().await;
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].question(), "How long to knead");
    assert_eq!(session.history()[0].answer(), "reply 1");
}

#[tokio::test]
async fn test_unreadable_pdf_shows_index_error_with_way_out() {
    let h = harness();
    let (id, session) = h.sessions.get_or_create(None).await;

    let response = h
        .router
        .clone()
        .oneshot(upload_request(&id, "broken.pdf", b"%PDF-1.4\nthis is not a pdf body"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains(r#"class="notice notice-error""#));
    assert!(html.contains(r#"action="/session/end""#));
    assert_eq!(session.lock().await.phase(), SessionPhase::IndexError);
    assert_eq!(h.embedder.document_calls(), 0);
}

#[tokio::test]
async fn test_dropped_upload_request_still_finishes_indexing() {
    let embedder = Arc::new(GatedEmbedder::closed());
    let chat = Arc::new(FakeChat::default());
    let sessions = SessionStore::new(SessionStoreConfig::default());
    let state = ReaderState {
        pipeline: Arc::new(IndexingPipeline::new(
            Arc::clone(&embedder) as Arc<dyn Embedder>,
            Arc::clone(&chat) as Arc<dyn ChatModel>,
        )),
        sessions: sessions.clone(),
    };
    let router = reader::router(state, 1024 * 1024);
    let (id, session) = sessions.get_or_create(None).await;

    let request = upload_request(&id, "recipe.pdf", &minimal_pdf("Simmer the sauce slowly"));
    let in_flight = tokio::spawn(router.clone().oneshot(request));
    wait_for_phase(&session, SessionPhase::Indexing).await;

    // While indexing, the page offers a way to end the session
    let page = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie(&id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(body_text(page).await.contains(r#"action="/session/end""#));

    in_flight.abort();
    assert!(in_flight.await.unwrap_err().is_cancelled());

    embedder.open();
    wait_for_phase(&session, SessionPhase::Ready).await;
    assert_eq!(embedder.inner.document_calls(), 1);
}
