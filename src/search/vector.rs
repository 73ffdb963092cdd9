use std::sync::Arc;

use crate::core::config::RetrievalConfig;
use crate::core::errors::RagError;

use super::{Candidate, Modality, SearchEngine};

/// Similarity search against one of the named per-modality vector indexes.
///
/// The query vector must match the target index's configured dimensionality;
/// the engine rejects mismatches and that rejection propagates as-is.
#[derive(Clone)]
pub struct VectorRetriever {
    engine: Arc<dyn SearchEngine>,
    config: RetrievalConfig,
}

impl VectorRetriever {
    pub fn new(engine: Arc<dyn SearchEngine>, config: RetrievalConfig) -> Self {
        Self { engine, config }
    }

    /// Top-`k` candidates by vector similarity on the given modality.
    ///
    /// Asks the engine to consider a larger pool (`min(pool_cap, k * mult)`)
    /// than it returns, which trades a little engine work for recall. A
    /// missing index is a hard failure: it indicates a setup bug, not an
    /// empty corpus.
    pub async fn retrieve(
        &self,
        query_vector: &[f32],
        modality: Modality,
        k: usize,
    ) -> Result<Vec<Candidate>, RagError> {
        let (index, vector_path) = match modality {
            Modality::Text => (&self.config.text_index, &self.config.text_vector_path),
            Modality::Image => (&self.config.image_index, &self.config.image_vector_path),
        };

        let pool = self.config.candidate_pool(k);
        let mut candidates = self
            .engine
            .vector_search(index, vector_path, query_vector, pool, k)
            .await?;

        // The engine already ranks; the truncate only guards sloppy adapters.
        candidates.truncate(k);

        tracing::debug!(
            "vector search ({}) returned {} candidates for k={}",
            modality.as_str(),
            candidates.len(),
            k
        );
        Ok(candidates)
    }
}
