//! Embedding generation over HTTP providers.
//!
//! This module provides:
//! - `TextEmbedder` / `ImageEmbedder` traits for the pipeline seams
//! - `HttpEmbeddingGateway` talking to an OpenAI-style embeddings endpoint
//! - MIME normalization for image payloads

mod http;

pub use http::HttpEmbeddingGateway;

use async_trait::async_trait;

use crate::core::errors::RagError;

/// Text embedding provider.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed an ordered batch in a single provider request.
    ///
    /// The i-th output vector corresponds to the i-th input string; callers
    /// zip the result back onto source documents, so this ordering is
    /// load-bearing.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Convenience for a single string.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Provider("provider returned no embedding".to_string()))
    }
}

/// Image embedding provider.
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    /// Embed raw image bytes.
    ///
    /// Returns `Ok(None)` when the provider cannot embed the image even
    /// after the rate-limit retry; callers treat that as "skip this modality
    /// for this document", never as a fatal error.
    async fn embed_image(&self, bytes: &[u8], mime_type: &str)
        -> Result<Option<Vec<f32>>, RagError>;
}

const SUPPORTED_IMAGE_MIME_TYPES: [&str; 4] =
    ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Clamp a declared MIME type to the provider's supported set, defaulting to
/// JPEG on anything unknown.
pub fn normalize_mime_type(mime_type: &str) -> &'static str {
    let lowered = mime_type.trim().to_ascii_lowercase();
    let lowered = if lowered == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        lowered
    };
    SUPPORTED_IMAGE_MIME_TYPES
        .iter()
        .find(|supported| **supported == lowered)
        .copied()
        .unwrap_or("image/jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_pass_through() {
        assert_eq!(normalize_mime_type("image/png"), "image/png");
        assert_eq!(normalize_mime_type("IMAGE/WEBP"), "image/webp");
    }

    #[test]
    fn jpg_alias_and_unknown_types_become_jpeg() {
        assert_eq!(normalize_mime_type("image/jpg"), "image/jpeg");
        assert_eq!(normalize_mime_type("application/pdf"), "image/jpeg");
        assert_eq!(normalize_mime_type(""), "image/jpeg");
    }
}
