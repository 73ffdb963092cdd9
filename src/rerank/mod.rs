//! Candidate reranking.
//!
//! This module provides:
//! - `TextReranker` / `MultimodalReranker` traits over cross-encoder
//!   providers
//! - HTTP gateways for both provider shapes
//! - `RerankOrchestrator`, which selects and executes a strategy per request

mod http;
mod orchestrator;

pub use http::{HttpMultimodalRerankGateway, HttpTextRerankGateway};
pub use orchestrator::{select_strategy, QueryType, RerankOrchestrator, RerankStrategy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// One reranker verdict: the candidate at `index` in the submitted document
/// list, with the model's joint (query, document) relevance score.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankedHit {
    pub index: usize,
    pub relevance_score: f64,
}

/// A document as submitted to the multimodal reranker.
#[derive(Debug, Clone)]
pub enum RerankDocument {
    Text(String),
    ImageBase64 { data: String, mime_type: String },
}

/// Text cross-encoder reranker.
#[async_trait]
pub trait TextReranker: Send + Sync {
    /// Score `documents` against `query`, returning up to `top_k` hits in
    /// descending relevance order.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RankedHit>, RagError>;
}

/// Reranker accepting image documents (with text fallbacks) against a text
/// query.
#[async_trait]
pub trait MultimodalReranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[RerankDocument],
        top_n: usize,
    ) -> Result<Vec<RankedHit>, RagError>;
}
