//! Logo fetcher backing the image-cache seam

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::debug;

use crate::core::ImageCache;
use crate::store::LogoStore;

/// Fetches logo bytes over HTTP and persists them in the logo store. URIs
/// already present are skipped, so warm-up stays cheap across re-fetches and
/// across runs.
pub struct HttpImageCache {
    client: reqwest::Client,
    store: Arc<LogoStore>,
}

impl HttpImageCache {
    pub fn new(store: Arc<LogoStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("onramp/0.2")
            .build()
            .context("Failed to build image HTTP client")?;
        Ok(Self { client, store })
    }
}

#[async_trait]
impl ImageCache for HttpImageCache {
    async fn warm(&self, uri: &str) -> Result<()> {
        if self.store.contains(uri) {
            debug!(%uri, "Logo already warm");
            return Ok(());
        }

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for logo URI: {}", e, uri))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for logo URI: {}",
                response.status(),
                uri
            ));
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read logo bytes for URI: {uri}"))?;
        self.store.put(uri, &bytes);
        debug!(%uri, size = bytes.len(), "Warmed logo");
        Ok(())
    }
}
