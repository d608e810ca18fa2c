//! IP-based geolocation types

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Country and optional state detected from the caller's IP. Consumed once to
/// seed request parameters when the user supplied no country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedCountry {
    pub country_code: String,
    pub state: Option<String>,
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn detect_country(&self) -> Result<DetectedCountry>;
}
