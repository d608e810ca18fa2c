//! Service provider directory types

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Logo variant to resolve for a display theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoTheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderLogos {
    pub light: Option<String>,
    pub dark: Option<String>,
}

impl ProviderLogos {
    pub fn uri(&self, theme: LogoTheme) -> Option<&str> {
        match theme {
            LogoTheme::Light => self.light.as_deref(),
            LogoTheme::Dark => self.dark.as_deref(),
        }
    }
}

/// A service provider eligible for some country, independent of any quote set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub logos: ProviderLogos,
}

/// The set of eligible providers returned by one directory fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSet {
    pub fetch_id: u64,
    pub providers: Vec<ServiceProvider>,
}

impl ProviderSet {
    pub fn new(fetch_id: u64, providers: Vec<ServiceProvider>) -> Self {
        Self {
            fetch_id,
            providers,
        }
    }
}

#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn fetch_providers(&self, country: &str) -> Result<Vec<ServiceProvider>>;
}
