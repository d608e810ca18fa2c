//! Image cache warm-up seam

use anyhow::Result;
use async_trait::async_trait;

/// Best-effort image cache. `warm` fetches and stores one image so a later
/// consumer finds it locally; callers decide whether failures matter.
#[async_trait]
pub trait ImageCache: Send + Sync {
    async fn warm(&self, uri: &str) -> Result<()>;
}
