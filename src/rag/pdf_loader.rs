// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF text extraction
//!
//! Uploads are written to a named temporary file and extracted from disk.
//! The file is removed when the handle drops, on success or failure.
//! Extraction is CPU-bound; async callers run it on the blocking pool.

use std::io::Write;
use tracing::{debug, info};

use super::errors::IndexingError;
use super::models::LoadedDocument;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Check the `%PDF-` header
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Extract all text from an uploaded PDF
pub fn load_pdf_bytes(name: &str, bytes: &[u8]) -> Result<LoadedDocument, IndexingError> {
    if bytes.is_empty() {
        return Err(IndexingError::InvalidDocument("file is empty".to_string()));
    }
    if !looks_like_pdf(bytes) {
        return Err(IndexingError::InvalidDocument(format!(
            "{} does not start with a PDF header",
            name
        )));
    }

    let mut tmp = tempfile::Builder::new()
        .prefix("ragified-")
        .suffix(".pdf")
        .tempfile()?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    debug!("Wrote {} bytes to {}", bytes.len(), tmp.path().display());

    let text = pdf_extract::extract_text(tmp.path())
        .map_err(|e| IndexingError::Extraction(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(IndexingError::EmptyDocument);
    }

    info!(
        "Extracted {} chars from {} ({} bytes)",
        text.chars().count(),
        name,
        bytes.len()
    );

    Ok(LoadedDocument {
        name: name.to_string(),
        text,
        size_bytes: bytes.len(),
    })
}
