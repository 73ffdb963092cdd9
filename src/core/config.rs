use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning constants and index wiring for the retrieval pipeline.
///
/// The numeric defaults are hand-picked operating points, not correctness
/// requirements; they are configurable so deployments can tune recall vs.
/// latency without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default result count when the caller gives no hint.
    pub default_k: usize,
    /// Upper bound on the caller-supplied result count.
    pub max_k: usize,
    /// RRF rank-smoothing constant.
    pub rrf_k_const: usize,
    /// Hard cap on the candidate pool requested from the engine.
    pub pool_cap: usize,
    /// Candidate pool size per requested result (`pool = min(cap, k * mult)`).
    pub pool_multiplier: usize,
    /// Cooldown before the single retry on a rate-limited provider call.
    pub rate_limit_cooldown_secs: u64,
    /// Named vector index over the text embedding field.
    pub text_index: String,
    /// Document path of the text embedding vector.
    pub text_vector_path: String,
    /// Named vector index over the image embedding field.
    pub image_index: String,
    /// Document path of the image embedding vector.
    pub image_vector_path: String,
    /// Full-text index over title/description. `None` in minimal deployments;
    /// lexical search then degrades to empty results.
    pub lexical_index: Option<String>,
    /// Fields the lexical index covers.
    pub lexical_paths: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_k: 20,
            rrf_k_const: 60,
            pool_cap: 200,
            pool_multiplier: 20,
            rate_limit_cooldown_secs: 60,
            text_index: "vector_index_text".to_string(),
            text_vector_path: "embedding.text".to_string(),
            image_index: "vector_index_image".to_string(),
            image_vector_path: "embedding.image".to_string(),
            lexical_index: Some("search_index".to_string()),
            lexical_paths: vec!["title".to_string(), "description".to_string()],
        }
    }
}

impl RetrievalConfig {
    /// Build a config from environment variables, falling back to defaults
    /// field by field. `RAGFUSE_LEXICAL_INDEX` set to the empty string
    /// disables lexical search entirely.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let lexical_index = match env::var("RAGFUSE_LEXICAL_INDEX") {
            Ok(name) if name.is_empty() => None,
            Ok(name) => Some(name),
            Err(_) => defaults.lexical_index,
        };

        Self {
            default_k: env_usize("RAGFUSE_DEFAULT_K", defaults.default_k),
            max_k: env_usize("RAGFUSE_MAX_K", defaults.max_k),
            rrf_k_const: env_usize("RAGFUSE_RRF_K", defaults.rrf_k_const),
            pool_cap: env_usize("RAGFUSE_POOL_CAP", defaults.pool_cap),
            pool_multiplier: env_usize("RAGFUSE_POOL_MULT", defaults.pool_multiplier),
            rate_limit_cooldown_secs: env_u64(
                "RAGFUSE_RATE_LIMIT_COOLDOWN_SECS",
                defaults.rate_limit_cooldown_secs,
            ),
            text_index: env_string("RAGFUSE_TEXT_INDEX", defaults.text_index),
            text_vector_path: env_string("RAGFUSE_TEXT_VECTOR_PATH", defaults.text_vector_path),
            image_index: env_string("RAGFUSE_IMAGE_INDEX", defaults.image_index),
            image_vector_path: env_string("RAGFUSE_IMAGE_VECTOR_PATH", defaults.image_vector_path),
            lexical_index,
            lexical_paths: defaults.lexical_paths,
        }
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    /// Candidate pool requested from the engine for a `k`-result query.
    pub fn candidate_pool(&self, k: usize) -> usize {
        self.pool_cap.min(k.saturating_mul(self.pool_multiplier))
    }
}

fn env_string(key: &str, default: String) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
