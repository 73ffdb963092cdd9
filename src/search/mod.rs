//! Retrieval over the managed search engine.
//!
//! This module provides:
//! - `SearchEngine` trait abstracting the engine's vector and lexical
//!   query primitives
//! - `VectorRetriever` for per-modality similarity search
//! - `LexicalRetriever` for full-text search with degrade-not-fail semantics

mod lexical;
mod vector;

pub use lexical::LexicalRetriever;
pub use vector::VectorRetriever;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// A retrieved document plus a stage-local relevance score.
///
/// Scores are modality- and stage-specific: a vector similarity score, a
/// lexical relevance score, a fused RRF score, and a reranker score all live
/// on different scales and are only comparable within one stage's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable document identifier.
    pub id: String,
    pub title: String,
    pub description: String,
    /// URI/key resolvable to image bytes via the external store.
    pub cover_image: Option<String>,
    /// Stage-local relevance score (higher = more relevant).
    pub score: f64,
}

/// The independently embedded representations of a catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
        }
    }
}

/// Query primitives of the managed document database.
///
/// Implementations are thin adapters over the engine's aggregation-style
/// vector and text search stages. Both primitives are read-only and return
/// candidates carrying the engine's own score meta-field; an empty result
/// set is a valid, non-error outcome (documents without an embedding for
/// the queried modality are simply invisible to that index).
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Similarity query against a named vector index.
    ///
    /// `num_candidates` is the engine-internal consideration pool; `limit`
    /// bounds the returned list. A missing or misnamed index must surface
    /// as an error (configuration bug), never as an empty result.
    async fn vector_search(
        &self,
        index: &str,
        vector_path: &str,
        query_vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<Candidate>, RagError>;

    /// Keyword/phrase query against a named full-text index over `paths`.
    async fn text_search(
        &self,
        index: &str,
        query: &str,
        paths: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>, RagError>;
}
