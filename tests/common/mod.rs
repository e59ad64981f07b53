// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Shared fakes for the hosted model traits
#![allow(dead_code)]

use async_trait::async_trait;
use ragified::rag::{ChatModel, Embedder, IndexingPipeline, LoadedDocument, QaChain};
use ragified::upstream::UpstreamError;
use ragified::vision::FoodAnalyzer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Letter-frequency embedding; similar texts get similar vectors
pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 27];
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
    }
    v[26] = 1.0;
    v
}

#[derive(Default)]
pub struct FakeEmbedder {
    pub document_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub embedded_texts: AtomicUsize,
}

impl FakeEmbedder {
    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        self.embedded_texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| letter_vector(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(letter_vector(text))
    }
}

/// Embeds like [`FakeEmbedder`] but only once the gate is opened
pub struct GatedEmbedder {
    pub inner: FakeEmbedder,
    gate: Semaphore,
}

impl GatedEmbedder {
    pub fn closed() -> Self {
        Self {
            inner: FakeEmbedder::default(),
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1024);
    }
}

#[async_trait]
impl Embedder for GatedEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;
        self.inner.embed_documents(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        self.inner.embed_query(text).await
    }
}

/// Records every prompt; answers with a numbered reply or a fixed error
#[derive(Default)]
pub struct FakeChat {
    pub prompts: Mutex<Vec<String>>,
    pub failure: Mutex<Option<UpstreamError>>,
}

impl FakeChat {
    pub fn failing(error: UpstreamError) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(error)),
        }
    }

    pub fn set_failure(&self, error: Option<UpstreamError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("reply {}", prompts.len()))
    }
}

pub struct FakeAnalyzer {
    pub calls: AtomicUsize,
    pub result: Result<String, UpstreamError>,
}

impl FakeAnalyzer {
    pub fn answering(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            result: Ok(text.to_string()),
        }
    }

    pub fn failing(error: UpstreamError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            result: Err(error),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FoodAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _base64_image: &str, _mime: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }
}

pub const SAMPLE_TEXT: &str = "Rust is a systems programming language focused on safety.\n\n\
Ownership rules let the compiler free memory without a garbage collector.\n\n\
Tokio is an asynchronous runtime for writing network applications.";

pub fn sample_document() -> LoadedDocument {
    LoadedDocument {
        name: "rust.pdf".to_string(),
        text: SAMPLE_TEXT.to_string(),
        size_bytes: SAMPLE_TEXT.len(),
    }
}

pub fn pipeline(embedder: &Arc<FakeEmbedder>, chat: &Arc<FakeChat>) -> IndexingPipeline {
    IndexingPipeline::new(
        Arc::clone(embedder) as Arc<dyn Embedder>,
        Arc::clone(chat) as Arc<dyn ChatModel>,
    )
}

pub async fn ready_chain(embedder: &Arc<FakeEmbedder>, chat: &Arc<FakeChat>) -> QaChain {
    pipeline(embedder, chat)
        .index_document("test-session", sample_document())
        .await
        .unwrap()
}

/// Single-page PDF showing `text` in Helvetica, with a valid xref table
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref_at = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    pdf.into_bytes()
}

/// Collapse whitespace so extracted text can be compared regardless of layout
pub fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
