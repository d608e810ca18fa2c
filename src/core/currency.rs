//! Fiat and crypto currency reference types

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatCurrency {
    pub code: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

impl FiatCurrency {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_uppercase(),
            name: None,
            symbol: None,
        }
    }

    /// Fallback spend currency when the preferred one is not eligible.
    pub fn usd() -> Self {
        Self {
            code: "USD".to_string(),
            name: Some("US Dollar".to_string()),
            symbol: Some("$".to_string()),
        }
    }
}

/// A purchasable crypto asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoCurrency {
    pub code: String,
    pub name: Option<String>,
}

/// Eligible fiat currencies for a country. An empty list means onramping is
/// not available there at all.
#[async_trait]
pub trait CurrencySupport: Send + Sync {
    async fn supported_fiat(&self, country: &str) -> Result<Vec<FiatCurrency>>;
}
