use std::sync::Arc;

use crate::core::config::RetrievalConfig;
use crate::core::errors::RagError;

use super::{Candidate, SearchEngine};

/// Full-text search over the catalog's title/description fields.
///
/// Lexical search is an enhancement to hybrid retrieval, not a requirement:
/// if no lexical index is configured, or the engine query fails for any
/// reason, the retriever resolves to an empty list and logs a warning
/// instead of failing the request.
#[derive(Clone)]
pub struct LexicalRetriever {
    engine: Arc<dyn SearchEngine>,
    config: RetrievalConfig,
}

impl LexicalRetriever {
    pub fn new(engine: Arc<dyn SearchEngine>, config: RetrievalConfig) -> Self {
        Self { engine, config }
    }

    /// Up to `k` candidates by lexical relevance, or `[]` when the signal
    /// is unavailable.
    pub async fn retrieve_by_text(&self, query: &str, k: usize) -> Vec<Candidate> {
        let Some(index) = self.config.lexical_index.as_deref() else {
            tracing::warn!("lexical search skipped: no lexical index configured");
            return Vec::new();
        };

        match self
            .engine
            .text_search(index, query, &self.config.lexical_paths, k)
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!("lexical search failed, continuing without it: {}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FailingEngine;

    #[async_trait]
    impl SearchEngine for FailingEngine {
        async fn vector_search(
            &self,
            _index: &str,
            _vector_path: &str,
            _query_vector: &[f32],
            _num_candidates: usize,
            _limit: usize,
        ) -> Result<Vec<Candidate>, RagError> {
            Ok(vec![])
        }

        async fn text_search(
            &self,
            _index: &str,
            _query: &str,
            _paths: &[String],
            _limit: usize,
        ) -> Result<Vec<Candidate>, RagError> {
            Err(RagError::Provider("text index not found".to_string()))
        }
    }

    #[tokio::test]
    async fn engine_failure_degrades_to_empty() {
        let retriever =
            LexicalRetriever::new(Arc::new(FailingEngine), RetrievalConfig::default());
        let results = retriever.retrieve_by_text("red sneakers", 5).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_index_degrades_to_empty() {
        let config = RetrievalConfig {
            lexical_index: None,
            ..RetrievalConfig::default()
        };
        let retriever = LexicalRetriever::new(Arc::new(FailingEngine), config);
        let results = retriever.retrieve_by_text("red sneakers", 5).await;
        assert!(results.is_empty());
    }
}
