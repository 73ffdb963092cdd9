//! Per-request retrieval pipelines.
//!
//! Three entry points share one answer-assembly step:
//! - text: embed query → text-modality vector search → rerank → answer
//! - image: embed image → image-modality vector search → rerank → answer
//! - hybrid: embed query and lexical search concurrently → vector search →
//!   RRF fuse (when lexical found anything) → rerank → answer

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::config::RetrievalConfig;
use crate::core::errors::RagError;
use crate::embedding::{ImageEmbedder, TextEmbedder};
use crate::fusion::reciprocal_rank_fusion;
use crate::rerank::{QueryType, RerankOrchestrator};
use crate::search::{Candidate, LexicalRetriever, Modality, VectorRetriever};

/// Answer returned when the query image cannot be embedded. A corrupt or
/// unsupported image is an expected input condition, not a system fault, so
/// it gets a clear message and an empty context set instead of an error.
pub const COULD_NOT_EMBED_IMAGE_ANSWER: &str =
    "Sorry, I could not process the query image. Please try a different image.";

/// Fallback rerank/generation query for image-only requests, where the
/// providers need a text query but the caller sent none.
const IMAGE_ONLY_QUERY: &str = "Find the catalog items most similar to the query image.";

/// Generative language model collaborator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce an answer grounded in the given context candidates.
    async fn generate(&self, query: &str, context: &[Candidate]) -> Result<String, RagError>;
}

/// Public-safe projection of a candidate: embeddings and engine internals
/// never cross this boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    pub title: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub score: f64,
}

impl From<&Candidate> for ContextChunk {
    fn from(candidate: &Candidate) -> Self {
        Self {
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            cover_image: candidate.cover_image.clone(),
            score: candidate.score,
        }
    }
}

/// The only data shape handed back to the surrounding application.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub context_chunks: Vec<ContextChunk>,
}

/// Top-level pipeline wiring retrieval, fusion, reranking, and generation.
///
/// All collaborators are injected, long-lived, and read-only at request
/// time; the pipeline holds no per-request state.
pub struct RagPipeline {
    text_embedder: Arc<dyn TextEmbedder>,
    image_embedder: Arc<dyn ImageEmbedder>,
    vector: VectorRetriever,
    lexical: LexicalRetriever,
    rerank: RerankOrchestrator,
    generator: Arc<dyn Generator>,
    config: RetrievalConfig,
}

impl RagPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text_embedder: Arc<dyn TextEmbedder>,
        image_embedder: Arc<dyn ImageEmbedder>,
        vector: VectorRetriever,
        lexical: LexicalRetriever,
        rerank: RerankOrchestrator,
        generator: Arc<dyn Generator>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            text_embedder,
            image_embedder,
            vector,
            lexical,
            rerank,
            generator,
            config,
        }
    }

    /// Answer a plain text question over the catalog.
    pub async fn answer_text(&self, query: &str, k: usize) -> Result<RagAnswer, RagError> {
        let query = validated_query(query)?;
        let k = self.validated_k(k)?;

        let query_vector = self.text_embedder.embed_text(query).await?;
        let candidates = self.vector.retrieve(&query_vector, Modality::Text, k).await?;
        let candidates = self
            .rerank
            .rerank(query, candidates, k, QueryType::Text, true)
            .await?;

        self.assemble(query, candidates).await
    }

    /// Answer a query-by-image request, optionally with an accompanying
    /// text question.
    ///
    /// A failed image embedding short-circuits with a fixed answer and an
    /// empty context set; no retrieval is attempted.
    pub async fn answer_image(
        &self,
        image: &[u8],
        mime_type: &str,
        question: Option<&str>,
        k: usize,
    ) -> Result<RagAnswer, RagError> {
        if image.is_empty() {
            return Err(RagError::BadRequest("query image is empty".to_string()));
        }
        let k = self.validated_k(k)?;

        let Some(query_vector) = self.image_embedder.embed_image(image, mime_type).await? else {
            tracing::warn!("query image could not be embedded, returning fixed answer");
            return Ok(RagAnswer {
                answer: COULD_NOT_EMBED_IMAGE_ANSWER.to_string(),
                context_chunks: Vec::new(),
            });
        };

        let question = question.map(str::trim).filter(|q| !q.is_empty());
        let has_explicit_text_query = question.is_some();
        let query = question.unwrap_or(IMAGE_ONLY_QUERY);

        let candidates = self.vector.retrieve(&query_vector, Modality::Image, k).await?;
        let candidates = self
            .rerank
            .rerank(query, candidates, k, QueryType::Image, has_explicit_text_query)
            .await?;

        self.assemble(query, candidates).await
    }

    /// Answer a text question using both vector and lexical signals.
    ///
    /// The query embedding and the lexical search are independent, so they
    /// run concurrently. When lexical search found nothing (including the
    /// no-index deployment), the vector ranking is used as-is; otherwise the
    /// two lists are RRF-fused and truncated back to `k`.
    pub async fn answer_hybrid(&self, query: &str, k: usize) -> Result<RagAnswer, RagError> {
        let query = validated_query(query)?;
        let k = self.validated_k(k)?;

        let (embedded, lexical_candidates) = tokio::join!(
            self.text_embedder.embed_text(query),
            self.lexical.retrieve_by_text(query, k),
        );
        let query_vector = embedded?;

        let vector_candidates = self.vector.retrieve(&query_vector, Modality::Text, k).await?;

        let candidates = if lexical_candidates.is_empty() {
            vector_candidates
        } else {
            let mut fused = reciprocal_rank_fusion(
                &vector_candidates,
                &lexical_candidates,
                self.config.rrf_k_const,
            );
            fused.truncate(k);
            fused
        };

        // Hybrid always carries an explicit text query.
        let candidates = self
            .rerank
            .rerank(query, candidates, k, QueryType::Hybrid, true)
            .await?;

        self.assemble(query, candidates).await
    }

    async fn assemble(&self, query: &str, candidates: Vec<Candidate>) -> Result<RagAnswer, RagError> {
        let answer = self.generator.generate(query, &candidates).await?;
        let context_chunks = candidates.iter().map(ContextChunk::from).collect();
        Ok(RagAnswer {
            answer,
            context_chunks,
        })
    }

    fn validated_k(&self, k: usize) -> Result<usize, RagError> {
        if k == 0 {
            return Err(RagError::BadRequest(
                "result count must be positive".to_string(),
            ));
        }
        if k > self.config.max_k {
            return Err(RagError::BadRequest(format!(
                "result count {} exceeds maximum {}",
                k, self.config.max_k
            )));
        }
        Ok(k)
    }
}

fn validated_query(query: &str) -> Result<&str, RagError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(RagError::BadRequest("query must not be empty".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests;
