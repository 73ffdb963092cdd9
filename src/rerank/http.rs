use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::RagError;
use crate::core::retry::retry_on_rate_limit;

use super::{MultimodalReranker, RankedHit, RerankDocument, TextReranker};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RankedHit>,
}

async fn post_rerank(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &Value,
) -> Result<Vec<RankedHit>, RagError> {
    let res = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(RagError::provider)?;

    if res.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(RagError::RateLimited(format!(
            "rerank provider rate limited at {}",
            url
        )));
    }
    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        return Err(RagError::Provider(format!(
            "rerank request failed ({}): {}",
            status, text
        )));
    }

    let payload: RerankResponse = res.json().await.map_err(RagError::provider)?;
    Ok(payload.results)
}

fn build_client() -> Result<Client, RagError> {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(RagError::provider)
}

/// HTTP gateway to a text cross-encoder rerank endpoint.
#[derive(Clone)]
pub struct HttpTextRerankGateway {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    cooldown: Duration,
}

impl HttpTextRerankGateway {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        cooldown: Duration,
    ) -> Result<Self, RagError> {
        if api_key.is_empty() {
            return Err(RagError::Config(
                "rerank provider API key is not set".to_string(),
            ));
        }
        Ok(Self {
            client: build_client()?,
            url: format!("{}/rerank", base_url.trim_end_matches('/')),
            api_key,
            model,
            cooldown,
        })
    }
}

#[async_trait]
impl TextReranker for HttpTextRerankGateway {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RankedHit>, RagError> {
        let body = json!({
            "model": self.model,
            "query": query,
            "documents": documents,
            "top_k": top_k,
        });

        retry_on_rate_limit(self.cooldown, || {
            post_rerank(&self.client, &self.url, &self.api_key, &body)
        })
        .await
    }
}

/// HTTP gateway to a multimodal rerank endpoint taking mixed text/image
/// documents.
#[derive(Clone)]
pub struct HttpMultimodalRerankGateway {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    cooldown: Duration,
}

impl HttpMultimodalRerankGateway {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        cooldown: Duration,
    ) -> Result<Self, RagError> {
        if api_key.is_empty() {
            return Err(RagError::Config(
                "multimodal rerank provider API key is not set".to_string(),
            ));
        }
        Ok(Self {
            client: build_client()?,
            url: format!("{}/multimodal-rerank", base_url.trim_end_matches('/')),
            api_key,
            model,
            cooldown,
        })
    }
}

fn multimodal_document(document: &RerankDocument) -> Value {
    match document {
        RerankDocument::Text(text) => json!({ "text": text }),
        RerankDocument::ImageBase64 { data, mime_type } => json!({
            "image": format!("data:{};base64,{}", mime_type, data),
        }),
    }
}

#[async_trait]
impl MultimodalReranker for HttpMultimodalRerankGateway {
    async fn rerank(
        &self,
        query: &str,
        documents: &[RerankDocument],
        top_n: usize,
    ) -> Result<Vec<RankedHit>, RagError> {
        let payload_documents: Vec<Value> = documents.iter().map(multimodal_document).collect();
        let body = json!({
            "model": self.model,
            "query": query,
            "documents": payload_documents,
            "top_n": top_n,
        });

        retry_on_rate_limit(self.cooldown, || {
            post_rerank(&self.client, &self.url, &self.api_key, &body)
        })
        .await
    }
}
