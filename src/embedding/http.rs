use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::RagError;
use crate::core::retry::retry_on_rate_limit;

use super::{normalize_mime_type, ImageEmbedder, TextEmbedder};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP gateway to an embeddings provider.
///
/// Text requests go to `{base_url}/embeddings` with an ordered `input`
/// array; image requests go to `{base_url}/multimodal-embeddings` with a
/// base64 payload and declared MIME type. Rate-limited calls are retried
/// once after the configured cooldown.
#[derive(Clone)]
pub struct HttpEmbeddingGateway {
    client: Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
    cooldown: Duration,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl HttpEmbeddingGateway {
    pub fn new(
        base_url: String,
        api_key: String,
        text_model: String,
        image_model: String,
        cooldown: Duration,
    ) -> Result<Self, RagError> {
        if api_key.is_empty() {
            return Err(RagError::Config(
                "embedding provider API key is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(RagError::provider)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model,
            image_model,
            cooldown,
        })
    }

    async fn post_embeddings(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(RagError::provider)?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(RagError::RateLimited(format!(
                "embedding provider rate limited at {}",
                url
            )));
        }
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Provider(format!(
                "embedding request failed ({}): {}",
                status, text
            )));
        }

        let payload: EmbeddingsResponse = res.json().await.map_err(RagError::provider)?;
        Ok(payload.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbeddingGateway {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.text_model,
            "input": texts,
        });

        let vectors =
            retry_on_rate_limit(self.cooldown, || self.post_embeddings("/embeddings", &body))
                .await?;

        if vectors.len() != texts.len() {
            return Err(RagError::Provider(format!(
                "embedding count mismatch: sent {}, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl ImageEmbedder for HttpEmbeddingGateway {
    async fn embed_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<Option<Vec<f32>>, RagError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let body = json!({
            "model": self.image_model,
            "input": [{
                "image_base64": encoded,
                "mime_type": normalize_mime_type(mime_type),
            }],
        });

        let result = retry_on_rate_limit(self.cooldown, || {
            self.post_embeddings("/multimodal-embeddings", &body)
        })
        .await;

        match result {
            Ok(mut vectors) => Ok(vectors.pop()),
            Err(err) => {
                tracing::warn!("image embedding failed, skipping modality: {}", err);
                Ok(None)
            }
        }
    }
}
