use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::LogoTheme;
use crate::debounce::DEFAULT_DELAY;

const DEFAULT_AGGREGATOR_URL: &str = "https://api.onramp.dev/v1";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AggregatorConfig {
    pub base_url: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            base_url: DEFAULT_AGGREGATOR_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    /// Preferred fiat to spend when the country supports it.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Default target asset for the quote command.
    #[serde(default = "default_token")]
    pub token: String,
    /// Fixed country; skips geolocation when set.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub theme: LogoTheme,
    /// Override for the amount-settle delay.
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_token() -> String {
    "ETH".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            aggregator: AggregatorConfig::default(),
            currency: default_currency(),
            token: default_token(),
            country: None,
            theme: LogoTheme::default(),
            debounce_ms: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "onramp", "onramp")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "onramp", "onramp")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| DEFAULT_DELAY.saturating_mul(2))
    }
}
