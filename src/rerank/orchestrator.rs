use std::sync::Arc;

use base64::Engine as _;
use futures_util::future::join_all;

use crate::core::errors::RagError;
use crate::embedding::normalize_mime_type;
use crate::images::ImageStore;
use crate::search::Candidate;

use super::{MultimodalReranker, RankedHit, RerankDocument, TextReranker};

/// What kind of query produced the candidate set being reranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Text,
    Image,
    Hybrid,
}

/// The reranking action chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerankStrategy {
    /// Text cross-encoder over `title + " " + description` documents.
    Text,
    /// Image-aware reranker over fetched cover images.
    Multimodal,
    /// Leave the candidate order untouched.
    PassThrough,
}

/// Pure strategy selection, separated from the I/O that executes it.
///
/// Text and hybrid queries use the text cross-encoder when one is wired.
/// Image queries prefer the multimodal reranker; without one, a
/// caller-supplied text question allows falling back to the text
/// cross-encoder, and without that there is no safe fallback.
pub fn select_strategy(
    query_type: QueryType,
    text_enabled: bool,
    multimodal_enabled: bool,
    has_explicit_text_query: bool,
) -> RerankStrategy {
    match query_type {
        QueryType::Text | QueryType::Hybrid => {
            if text_enabled {
                RerankStrategy::Text
            } else {
                RerankStrategy::PassThrough
            }
        }
        QueryType::Image => {
            if multimodal_enabled {
                RerankStrategy::Multimodal
            } else if text_enabled && has_explicit_text_query {
                RerankStrategy::Text
            } else {
                RerankStrategy::PassThrough
            }
        }
    }
}

/// Applies the selected rerank strategy to a retrieved candidate set.
///
/// Both gateways are optional; an unconfigured gateway simply disables its
/// strategy. Provider failures degrade to the unchanged candidate list —
/// reranking may reorder or shrink the set, but never empties it because a
/// provider misbehaved.
pub struct RerankOrchestrator {
    text: Option<Arc<dyn TextReranker>>,
    multimodal: Option<Arc<dyn MultimodalReranker>>,
    images: Option<Arc<dyn ImageStore>>,
}

impl RerankOrchestrator {
    pub fn new(
        text: Option<Arc<dyn TextReranker>>,
        multimodal: Option<Arc<dyn MultimodalReranker>>,
        images: Option<Arc<dyn ImageStore>>,
    ) -> Self {
        Self {
            text,
            multimodal,
            images,
        }
    }

    /// No-op orchestrator; every request passes through unchanged.
    pub fn disabled() -> Self {
        Self::new(None, None, None)
    }

    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        k: usize,
        query_type: QueryType,
        has_explicit_text_query: bool,
    ) -> Result<Vec<Candidate>, RagError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let strategy = select_strategy(
            query_type,
            self.text.is_some(),
            self.multimodal.is_some(),
            has_explicit_text_query,
        );
        let top_k = k.min(candidates.len());

        match strategy {
            RerankStrategy::PassThrough => {
                tracing::debug!("rerank pass-through for {:?} query", query_type);
                Ok(candidates)
            }
            RerankStrategy::Text => {
                let Some(reranker) = self.text.as_ref() else {
                    return Ok(candidates);
                };
                let documents: Vec<String> = candidates.iter().map(text_document).collect();
                let result = reranker.rerank(query, &documents, top_k).await;
                finish_rerank(candidates, result)
            }
            RerankStrategy::Multimodal => {
                let Some(reranker) = self.multimodal.as_ref() else {
                    return Ok(candidates);
                };
                let documents = self.build_image_documents(&candidates).await;
                let result = reranker.rerank(query, &documents, top_k).await;
                finish_rerank(candidates, result)
            }
        }
    }

    /// One rerank document per candidate, in candidate order: the fetched
    /// cover image where possible, the text document otherwise. Fetches run
    /// concurrently; failures degrade per candidate, not all-or-nothing.
    async fn build_image_documents(&self, candidates: &[Candidate]) -> Vec<RerankDocument> {
        let fetches = candidates.iter().map(|candidate| async {
            let Some(store) = self.images.as_ref() else {
                return RerankDocument::Text(text_document(candidate));
            };
            let Some(url) = candidate.cover_image.as_deref() else {
                return RerankDocument::Text(text_document(candidate));
            };
            match store.fetch(url).await {
                Ok(bytes) => RerankDocument::ImageBase64 {
                    data: base64::engine::general_purpose::STANDARD.encode(bytes),
                    mime_type: normalize_mime_type(guess_mime_type(url)).to_string(),
                },
                Err(err) => {
                    tracing::warn!(
                        "cover image fetch failed for {}, falling back to text: {}",
                        candidate.id,
                        err
                    );
                    RerankDocument::Text(text_document(candidate))
                }
            }
        });

        join_all(fetches).await
    }
}

/// The cross-encoder document for one candidate. An all-empty candidate
/// becomes a single space; some providers reject empty documents.
fn text_document(candidate: &Candidate) -> String {
    let document = format!("{} {}", candidate.title, candidate.description)
        .trim()
        .to_string();
    if document.is_empty() {
        " ".to_string()
    } else {
        document
    }
}

/// Provider outcome handling: a second rate limit (the retry wrapper already
/// ran inside the gateway) propagates; any other provider failure degrades
/// to the unchanged candidate list, same as an empty verdict.
fn finish_rerank(
    candidates: Vec<Candidate>,
    result: Result<Vec<RankedHit>, RagError>,
) -> Result<Vec<Candidate>, RagError> {
    match result {
        Ok(hits) => Ok(apply_hits(candidates, hits)),
        Err(err) if err.is_rate_limit() => Err(err),
        Err(err) => {
            tracing::warn!("rerank failed, keeping retrieval order: {}", err);
            Ok(candidates)
        }
    }
}

/// Reorder candidates by the reranker's verdicts, replacing each score with
/// the model's relevance score. Zero hits (provider returned nothing) keeps
/// the original list unchanged.
fn apply_hits(candidates: Vec<Candidate>, hits: Vec<RankedHit>) -> Vec<Candidate> {
    if hits.is_empty() {
        tracing::warn!("reranker returned no results, keeping retrieval order");
        return candidates;
    }

    let mut reranked = Vec::with_capacity(hits.len());
    for hit in hits {
        if let Some(candidate) = candidates.get(hit.index) {
            let mut candidate = candidate.clone();
            candidate.score = hit.relevance_score;
            reranked.push(candidate);
        } else {
            tracing::warn!("reranker returned out-of-range index {}", hit.index);
        }
    }

    if reranked.is_empty() {
        return candidates;
    }
    reranked
}

fn guess_mime_type(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    match path.rsplit('.').next().map(|ext| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "gif" => "image/gif",
        _ => "image/jpeg",
    }
}
