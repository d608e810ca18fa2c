//! HTTP client for the onramp aggregator API
//!
//! One client serves every collaborator seam: quotes, the service-provider
//! directory, eligible fiat currencies, the latest transaction, IP country
//! detection, and the purchasable-token listing. Response DTOs stay private
//! to this module; everything crossing the boundary is a core type.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{
    CryptoCurrency, CurrencySupport, DetectedCountry, FiatCurrency, Geolocator, PastTransaction,
    ProviderDirectory, ProviderLogos, Quote, QuoteRequest, QuoteSource, ServiceProvider,
    TransactionHistory,
};
use crate::providers::util::with_retry;

const RETRY_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

pub struct AggregatorClient {
    base_url: String,
    client: reqwest::Client,
}

impl AggregatorClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("onramp/0.2")
            .build()
            .context("Failed to build aggregator HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Purchasable crypto assets for a country.
    pub async fn list_tokens(&self, country: &str) -> Result<Vec<CryptoCurrency>> {
        let url = format!(
            "{}/crypto-currencies?countryCode={}",
            self.base_url, country
        );
        debug!("Requesting crypto currencies from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await },
            RETRY_ATTEMPTS,
            RETRY_DELAY,
        )
        .await
        .with_context(|| format!("Failed to list crypto currencies for country: {country}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} listing crypto currencies for country: {}",
                response.status(),
                country
            ));
        }

        let data: CryptoCurrenciesResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse crypto currencies for country: {country}"))?;
        Ok(data
            .crypto_currencies
            .into_iter()
            .map(|dto| CryptoCurrency {
                code: dto.currency_code,
                name: dto.name,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    quotes: Vec<QuoteDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteDto {
    service_provider: String,
    source_amount: Decimal,
    source_currency_code: String,
    destination_amount: Decimal,
    destination_currency_code: String,
    total_fee: Option<Decimal>,
    exchange_rate: Option<Decimal>,
}

impl From<QuoteDto> for Quote {
    fn from(dto: QuoteDto) -> Self {
        Quote {
            service_provider: dto.service_provider,
            source_amount: dto.source_amount,
            source_currency: dto.source_currency_code,
            destination_amount: dto.destination_amount,
            destination_currency: dto.destination_currency_code,
            total_fee: dto.total_fee,
            exchange_rate: dto.exchange_rate,
        }
    }
}

#[async_trait]
impl QuoteSource for AggregatorClient {
    #[instrument(
        name = "AggregatorQuoteFetch",
        skip(self, request),
        fields(country = %request.country, token = %request.destination_currency)
    )]
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>> {
        let mut url = format!(
            "{}/quotes?sourceAmount={}&sourceCurrencyCode={}&destinationCurrencyCode={}&countryCode={}",
            self.base_url,
            request.amount,
            request.source_currency,
            request.destination_currency,
            request.country
        );
        if let Some(region) = &request.region {
            url.push_str("&region=");
            url.push_str(region);
        }
        debug!("Requesting quotes from {}", url);

        // Quotes are live prices; a retry would only serve a staler market.
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for quotes URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} fetching quotes for country: {}",
                response.status(),
                request.country
            ));
        }

        let data: QuotesResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse quotes for country: {}", request.country))?;
        Ok(data.quotes.into_iter().map(Quote::from).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvidersResponse {
    service_providers: Vec<ServiceProviderDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceProviderDto {
    service_provider: String,
    name: Option<String>,
    url: Option<String>,
    logos: Option<LogosDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogosDto {
    light_logo: Option<String>,
    dark_logo: Option<String>,
}

impl From<ServiceProviderDto> for ServiceProvider {
    fn from(dto: ServiceProviderDto) -> Self {
        let logos = dto.logos.map_or_else(ProviderLogos::default, |l| {
            ProviderLogos {
                light: l.light_logo,
                dark: l.dark_logo,
            }
        });
        ServiceProvider {
            name: dto.name.unwrap_or_else(|| dto.service_provider.clone()),
            id: dto.service_provider,
            url: dto.url,
            logos,
        }
    }
}

#[async_trait]
impl ProviderDirectory for AggregatorClient {
    #[instrument(name = "AggregatorProviderFetch", skip(self), fields(country = %country))]
    async fn fetch_providers(&self, country: &str) -> Result<Vec<ServiceProvider>> {
        let url = format!(
            "{}/service-providers?countryCode={}",
            self.base_url, country
        );
        debug!("Requesting service providers from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await },
            RETRY_ATTEMPTS,
            RETRY_DELAY,
        )
        .await
        .with_context(|| format!("Failed to fetch service providers for country: {country}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} fetching service providers for country: {}",
                response.status(),
                country
            ));
        }

        let data: ProvidersResponse = response.json().await.with_context(|| {
            format!("Failed to parse service providers for country: {country}")
        })?;
        Ok(data
            .service_providers
            .into_iter()
            .map(ServiceProvider::from)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FiatCurrenciesResponse {
    fiat_currencies: Vec<FiatCurrencyDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FiatCurrencyDto {
    currency_code: String,
    name: Option<String>,
    symbol: Option<String>,
}

#[async_trait]
impl CurrencySupport for AggregatorClient {
    async fn supported_fiat(&self, country: &str) -> Result<Vec<FiatCurrency>> {
        let url = format!("{}/fiat-currencies?countryCode={}", self.base_url, country);
        debug!("Requesting fiat currencies from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await },
            RETRY_ATTEMPTS,
            RETRY_DELAY,
        )
        .await
        .with_context(|| format!("Failed to fetch fiat currencies for country: {country}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} fetching fiat currencies for country: {}",
                response.status(),
                country
            ));
        }

        let data: FiatCurrenciesResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse fiat currencies for country: {country}"))?;
        Ok(data
            .fiat_currencies
            .into_iter()
            .map(|dto| FiatCurrency {
                code: dto.currency_code.to_uppercase(),
                name: dto.name,
                symbol: dto.symbol,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    transaction: Option<TransactionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionDto {
    service_provider: Option<String>,
    destination_currency_code: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl TransactionHistory for AggregatorClient {
    async fn latest_transaction(&self) -> Result<Option<PastTransaction>> {
        let url = format!("{}/transactions/latest", self.base_url);
        debug!("Requesting latest transaction from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for latest transaction", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} fetching latest transaction",
                response.status()
            ));
        }

        let data: TransactionResponse = response
            .json()
            .await
            .context("Failed to parse latest transaction response")?;
        Ok(data.transaction.map(|dto| PastTransaction {
            service_provider: dto.service_provider,
            destination_currency: dto.destination_currency_code,
            created_at: dto.created_at,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountryResponse {
    country_code: String,
    state: Option<String>,
}

#[async_trait]
impl Geolocator for AggregatorClient {
    async fn detect_country(&self) -> Result<DetectedCountry> {
        let url = format!("{}/country", self.base_url);
        debug!("Requesting IP country from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await },
            RETRY_ATTEMPTS,
            RETRY_DELAY,
        )
        .await
        .context("Failed to detect country")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} detecting country",
                response.status()
            ));
        }

        let data: CountryResponse = response
            .json()
            .await
            .context("Failed to parse country detection response")?;
        Ok(DetectedCountry {
            country_code: data.country_code,
            state: data.state,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CryptoCurrenciesResponse {
    crypto_currencies: Vec<CryptoCurrencyDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CryptoCurrencyDto {
    currency_code: String,
    name: Option<String>,
}
