//! Cover-image retrieval from the external object store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::errors::RagError;

/// Read-only access to stored image binaries, keyed by URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Fetch the raw bytes behind `url`.
    ///
    /// Failures (store unavailable, object missing) surface as errors here;
    /// callers that can degrade per-image handle them locally.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RagError>;
}

/// `ImageStore` over plain HTTP GET, for stores that expose public or
/// presigned object URLs.
#[derive(Clone)]
pub struct HttpImageStore {
    client: Client,
}

impl HttpImageStore {
    pub fn new(timeout: Duration) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::provider)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RagError> {
        let res = self.client.get(url).send().await.map_err(RagError::provider)?;

        if !res.status().is_success() {
            return Err(RagError::Provider(format!(
                "image fetch failed ({}): {}",
                res.status(),
                url
            )));
        }

        let bytes = res.bytes().await.map_err(RagError::provider)?;
        Ok(bytes.to_vec())
    }
}
