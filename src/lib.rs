pub mod config;
pub mod core;
pub mod debounce;
pub mod display;
pub mod log;
pub mod prefetch;
pub mod providers;
pub mod readiness;
pub mod selection;
pub mod session;
pub mod store;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::core::{Geolocator, ProviderDirectory};
use crate::providers::{AggregatorClient, HttpImageCache};
use crate::session::{Collaborators, QuoteSession, SessionConfig};
use crate::store::LogoStore;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

pub enum AppCommand {
    Quote {
        amount: String,
        token: Option<String>,
        country: Option<String>,
        region: Option<String>,
    },
    Providers {
        country: Option<String>,
    },
    Tokens {
        country: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Onramp starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let aggregator = Arc::new(AggregatorClient::new(&config.aggregator.base_url)?);

    match command {
        AppCommand::Quote {
            amount,
            token,
            country,
            region,
        } => {
            let images = Arc::new(HttpImageCache::new(Arc::new(logo_store()))?);
            let collaborators = Collaborators {
                quotes: aggregator.clone(),
                providers: aggregator.clone(),
                currencies: aggregator.clone(),
                history: aggregator.clone(),
                geo: aggregator.clone(),
                images,
            };
            let session_config = SessionConfig {
                amount,
                token: token.unwrap_or_else(|| config.token.clone()),
                country: country.or_else(|| config.country.clone()),
                region,
                preferred_currency: config.currency.clone(),
                fallback_country: "US".to_string(),
                theme: config.theme,
                debounce: config.debounce(),
            };
            let session = QuoteSession::spawn(collaborators, session_config);

            let spinner = ui::new_spinner("Fetching quotes...");
            let settled = session.settled(SETTLE_TIMEOUT).await;
            spinner.finish_and_clear();

            println!("{}", display::render_quote_board(&settled?));
        }
        AppCommand::Providers { country } => {
            let country = resolve_country(&config, country, aggregator.as_ref()).await?;
            let providers = aggregator.fetch_providers(&country).await?;
            println!("{}", display::render_provider_list(&country, &providers));
        }
        AppCommand::Tokens { country } => {
            let country = resolve_country(&config, country, aggregator.as_ref()).await?;
            let tokens = aggregator.list_tokens(&country).await?;
            println!("{}", display::render_token_list(&country, &tokens));
        }
    }

    Ok(())
}

async fn resolve_country(
    config: &AppConfig,
    requested: Option<String>,
    geo: &AggregatorClient,
) -> Result<String> {
    if let Some(country) = requested.or_else(|| config.country.clone()) {
        return Ok(country.to_uppercase());
    }
    let detected = geo
        .detect_country()
        .await
        .context("No country given and geolocation failed")?;
    Ok(detected.country_code.to_uppercase())
}

fn logo_store() -> LogoStore {
    match AppConfig::default_data_path() {
        Ok(path) => LogoStore::open(&path.join("logos")),
        Err(error) => {
            debug!(%error, "No data directory, keeping the logo cache in memory");
            LogoStore::in_memory()
        }
    }
}
