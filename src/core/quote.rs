//! Quote abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced offer from one service provider to deliver `destination_amount`
/// of the target asset for `source_amount` of fiat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub service_provider: String,
    pub source_amount: Decimal,
    pub source_currency: String,
    pub destination_amount: Decimal,
    pub destination_currency: String,
    pub total_fee: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
}

/// The complete set of quotes returned by one fetch.
///
/// `fetch_id` is stamped by the session per completed fetch. Two sets are the
/// same set only when their ids match; value-identical contents from a newer
/// fetch form a new set.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSet {
    pub fetch_id: u64,
    pub quotes: Vec<Quote>,
}

impl QuoteSet {
    pub fn new(fetch_id: u64, quotes: Vec<Quote>) -> Self {
        Self { fetch_id, quotes }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Parameters a quote fetch is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub amount: Decimal,
    pub source_currency: String,
    pub destination_currency: String,
    pub country: String,
    pub region: Option<String>,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>>;
}
