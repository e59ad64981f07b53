// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Session-scoped vector storage for RAG
// Chunks live in memory for the lifetime of one chat session and are dropped with it

use anyhow::{anyhow, Result};
use std::time::Instant;

use super::embeddings::cosine_similarity;
use super::models::DocumentChunk;

/// Entry stored in the vector store
#[derive(Clone, Debug)]
pub struct VectorEntry {
    pub vector: Vec<f32>,
    pub chunk: DocumentChunk,
    pub created_at: Instant,
}

/// Result from vector search
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Session-scoped vector storage
/// - Dimension is fixed by the first vector added
/// - Supports semantic search via cosine similarity
#[derive(Debug)]
pub struct SessionVectorStore {
    session_id: String,
    entries: Vec<VectorEntry>,
    dimensions: Option<usize>,
    max_vectors: usize,
}

impl SessionVectorStore {
    /// Create new session vector store
    ///
    /// # Arguments
    /// * `session_id` - Unique session identifier
    /// * `max_vectors` - Maximum number of vectors allowed (memory limit)
    pub fn new(session_id: String, max_vectors: usize) -> Self {
        Self {
            session_id,
            entries: Vec::new(),
            dimensions: None,
            max_vectors,
        }
    }

    /// Add an embedded chunk
    ///
    /// # Returns
    /// * `Err` if dimensions differ from earlier vectors, values are not
    ///   finite, or capacity is reached
    pub fn add(&mut self, chunk: DocumentChunk, vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            return Err(anyhow!("Invalid vector: empty"));
        }
        if let Some(expected) = self.dimensions {
            if vector.len() != expected {
                return Err(anyhow!(
                    "Invalid vector dimensions: expected {}, got {}",
                    expected,
                    vector.len()
                ));
            }
        }

        // NaN or Infinity would break similarity ordering
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(anyhow!(
                "Invalid vector values: contains NaN or Infinity (all values must be finite numbers)"
            ));
        }

        if self.entries.len() >= self.max_vectors {
            return Err(anyhow!(
                "Maximum vector capacity reached: {} vectors (max: {})",
                self.entries.len(),
                self.max_vectors
            ));
        }

        self.dimensions = Some(vector.len());
        self.entries.push(VectorEntry {
            vector,
            chunk,
            created_at: Instant::now(),
        });

        Ok(())
    }

    /// Add chunks and their vectors pairwise
    pub fn add_all(&mut self, chunks: Vec<DocumentChunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(anyhow!(
                "Chunk/vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            ));
        }
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            self.add(chunk, vector)?;
        }
        Ok(())
    }

    /// Get count of vectors in store
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension of stored vectors, once known
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get maximum vector capacity
    pub fn max_vectors(&self) -> usize {
        self.max_vectors
    }

    /// Search for similar chunks using cosine similarity
    ///
    /// # Returns
    /// * `Ok(Vec<SearchResult>)` - Top-k results sorted by score descending,
    ///   ties broken by chunk order
    /// * `Err` if query dimensions differ from stored vectors
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let Some(expected) = self.dimensions else {
            return Ok(Vec::new());
        };
        if query.len() != expected {
            return Err(anyhow!(
                "Invalid query dimensions: expected {}, got {}",
                expected,
                query.len()
            ));
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                score: cosine_similarity(query, &entry.vector),
                chunk: entry.chunk.clone(),
            })
            .collect();

        // Stable sort keeps document order among equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }
}
