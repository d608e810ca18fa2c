//! Event-driven purchase session
//!
//! One driver task owns the whole session state. User input, debouncer
//! emissions, and fetch completions all arrive as events on a single channel;
//! the driver applies each event, re-derives selection and readiness, and
//! publishes a snapshot. Fetches run as detached tasks stamped with a
//! generation counter, so a completion from superseded parameters is
//! discarded instead of clobbering current state.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::core::{
    CurrencySupport, DetectedCountry, FetchState, FiatCurrency, Geolocator, ImageCache, LogoTheme,
    PastTransaction, ProviderDirectory, ProviderSet, Quote, QuoteRequest, QuoteSet, QuoteSource,
    ServiceProvider, TransactionHistory,
};
use crate::debounce::{DEFAULT_DELAY, Debouncer};
use crate::prefetch::LogoPrefetcher;
use crate::readiness::{FlowNotice, classify_notice, continue_enabled, select_fiat};
use crate::selection::{SelectionState, reconcile, should_clear};

/// Everything the session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub quotes: Arc<dyn QuoteSource>,
    pub providers: Arc<dyn ProviderDirectory>,
    pub currencies: Arc<dyn CurrencySupport>,
    pub history: Arc<dyn TransactionHistory>,
    pub geo: Arc<dyn Geolocator>,
    pub images: Arc<dyn ImageCache>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Amount as initially typed; seeds the pipeline without a debounce wait.
    pub amount: String,
    pub token: String,
    pub country: Option<String>,
    pub region: Option<String>,
    /// Spend currency to prefer when the country supports it.
    pub preferred_currency: String,
    /// Country to fall back to when geolocation fails.
    pub fallback_country: String,
    pub theme: LogoTheme,
    pub debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            amount: String::new(),
            token: "ETH".to_string(),
            country: None,
            region: None,
            preferred_currency: "USD".to_string(),
            fallback_country: "US".to_string(),
            theme: LogoTheme::default(),
            debounce: DEFAULT_DELAY.saturating_mul(2),
        }
    }
}

/// Request parameters as the user has shaped them so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub raw_amount: String,
    pub amount: Decimal,
    pub debounced_amount: Decimal,
    pub country: Option<String>,
    pub region: Option<String>,
    pub token: String,
}

/// Snapshot of the whole session, published after every event.
#[derive(Clone)]
pub struct SessionState {
    pub params: RequestParams,
    pub quotes: FetchState<QuoteSet>,
    pub providers: FetchState<ProviderSet>,
    pub currencies: FetchState<Vec<FiatCurrency>>,
    pub last_transaction: Option<PastTransaction>,
    pub selection: SelectionState,
    pub spend_currency: FiatCurrency,
    pub preferred_currency_eligible: bool,
    pub region_unsupported: bool,
    pub notice: Option<FlowNotice>,
    pub continue_enabled: bool,
    geo_pending: bool,
    history_pending: bool,
    started: bool,
    inputs_applied: u64,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        Self {
            params: RequestParams {
                raw_amount: String::new(),
                amount: Decimal::ZERO,
                debounced_amount: Decimal::ZERO,
                country: None,
                region: None,
                token: config.token.to_uppercase(),
            },
            quotes: FetchState::idle(),
            providers: FetchState::idle(),
            currencies: FetchState::idle(),
            last_transaction: None,
            selection: SelectionState::cleared(),
            spend_currency: FiatCurrency::new(&config.preferred_currency),
            preferred_currency_eligible: true,
            region_unsupported: false,
            notice: None,
            continue_enabled: false,
            geo_pending: false,
            history_pending: false,
            started: false,
            inputs_applied: 0,
        }
    }

    /// True while a quote fetch is in flight or the typed amount has not
    /// settled through the debounce window yet.
    pub fn quote_refresh_pending(&self) -> bool {
        self.quotes.loading || self.params.amount != self.params.debounced_amount
    }

    /// True once every pending source has resolved and the typed amount has
    /// settled; one-shot consumers render at this point.
    pub fn is_settled(&self) -> bool {
        self.started
            && !self.geo_pending
            && !self.history_pending
            && !self.providers.loading
            && !self.currencies.loading
            && !self.quotes.loading
            && self.params.amount == self.params.debounced_amount
    }
}

enum Event {
    SetAmount(String),
    SetCountry(String),
    SetToken(String),
    AmountSettled(Decimal),
    CountryDetected(Result<DetectedCountry, String>),
    HistoryDone(Result<Option<PastTransaction>, String>),
    QuotesDone {
        generation: u64,
        result: Result<Vec<Quote>, String>,
    },
    ProvidersDone {
        generation: u64,
        result: Result<Vec<ServiceProvider>, String>,
    },
    CurrenciesDone {
        generation: u64,
        result: Result<Vec<FiatCurrency>, String>,
    },
}

/// Handle to a running session.
pub struct QuoteSession {
    events: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<SessionState>,
    inputs_sent: Arc<AtomicU64>,
}

impl QuoteSession {
    pub fn spawn(collaborators: Collaborators, config: SessionConfig) -> Self {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let initial = SessionState::new(&config);
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let debouncer = Debouncer::new(config.debounce);
        let mut debounced = debouncer.subscribe();
        let forward = event_tx.clone();
        tokio::spawn(async move {
            while debounced.changed().await.is_ok() {
                let settled = *debounced.borrow();
                if let Some(amount) = settled {
                    if forward.send(Event::AmountSettled(amount)).is_err() {
                        break;
                    }
                }
            }
        });

        let prefetcher = LogoPrefetcher::new(Arc::clone(&collaborators.images), config.theme);
        let mut driver = Driver {
            state: initial,
            collaborators,
            config,
            events: event_tx.clone(),
            publish: state_tx,
            debouncer,
            prefetcher,
            quote_generation: 0,
            directory_generation: 0,
            quote_key: None,
            directory_country: None,
        };

        tokio::spawn(async move {
            driver.start();
            if driver.publish_snapshot() {
                return;
            }
            while let Some(event) = event_rx.recv().await {
                driver.apply(event);
                if driver.publish_snapshot() {
                    break;
                }
            }
        });

        Self {
            events: event_tx,
            state: state_rx,
            inputs_sent: Arc::new(AtomicU64::new(0)),
        }
    }

    fn send_input(&self, event: Event) {
        self.inputs_sent.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(event);
    }

    pub fn set_amount(&self, raw: &str) {
        self.send_input(Event::SetAmount(raw.to_string()));
    }

    pub fn set_country(&self, code: &str) {
        self.send_input(Event::SetCountry(code.to_string()));
    }

    pub fn set_token(&self, code: &str) {
        self.send_input(Event::SetToken(code.to_string()));
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Waits until every input sent so far has been applied and the session
    /// has settled (or `limit` elapses), and returns the settled snapshot.
    pub async fn settled(&self, limit: Duration) -> Result<SessionState> {
        let target = self.inputs_sent.load(Ordering::SeqCst);
        let mut rx = self.state.clone();
        let wait = async move {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if state.inputs_applied >= target && state.is_settled() {
                        return Ok(state.clone());
                    }
                }
                if rx.changed().await.is_err() {
                    anyhow::bail!("session closed before settling");
                }
            }
        };
        tokio::time::timeout(limit, wait)
            .await
            .context("session did not settle in time")?
    }
}

struct Driver {
    state: SessionState,
    collaborators: Collaborators,
    config: SessionConfig,
    events: mpsc::UnboundedSender<Event>,
    publish: watch::Sender<SessionState>,
    debouncer: Debouncer<Decimal>,
    prefetcher: LogoPrefetcher,
    quote_generation: u64,
    directory_generation: u64,
    quote_key: Option<QuoteRequest>,
    directory_country: Option<String>,
}

impl Driver {
    fn start(&mut self) {
        let params = &mut self.state.params;
        params.raw_amount = self.config.amount.clone();
        params.amount = parse_amount(&self.config.amount);
        // The seed value is the debounce baseline, not a change to coalesce.
        params.debounced_amount = params.amount;
        params.country = self.config.country.as_deref().map(str::to_uppercase);
        params.region = self.config.region.clone();
        self.state.started = true;

        if params.country.is_none() {
            self.state.geo_pending = true;
            let geo = Arc::clone(&self.collaborators.geo);
            let events = self.events.clone();
            tokio::spawn(async move {
                let result = geo.detect_country().await.map_err(|e| format!("{e:#}"));
                let _ = events.send(Event::CountryDetected(result));
            });
        }

        self.state.history_pending = true;
        let history = Arc::clone(&self.collaborators.history);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = history
                .latest_transaction()
                .await
                .map_err(|e| format!("{e:#}"));
            let _ = events.send(Event::HistoryDone(result));
        });

        self.after_apply();
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::SetAmount(raw) => {
                let amount = parse_amount(&raw);
                self.state.params.raw_amount = raw;
                self.state.params.amount = amount;
                self.state.inputs_applied += 1;
                self.debouncer.push(amount);
            }
            Event::AmountSettled(amount) => {
                self.state.params.debounced_amount = amount;
            }
            Event::SetCountry(code) => {
                // The region only ever comes from geolocation; an explicit
                // country choice resets it.
                self.state.params.country = Some(code.to_uppercase());
                self.state.params.region = None;
                self.state.inputs_applied += 1;
            }
            Event::SetToken(code) => {
                self.state.params.token = code.to_uppercase();
                self.state.inputs_applied += 1;
            }
            Event::CountryDetected(result) => {
                self.state.geo_pending = false;
                match result {
                    Ok(detected) => {
                        debug!(country = %detected.country_code, "Seeded country from geolocation");
                        self.state.params.country = Some(detected.country_code.to_uppercase());
                        self.state.params.region = detected.state;
                    }
                    Err(error) => {
                        warn!(
                            %error,
                            fallback = %self.config.fallback_country,
                            "Geolocation failed, using fallback country"
                        );
                        self.state.params.country =
                            Some(self.config.fallback_country.to_uppercase());
                    }
                }
            }
            Event::HistoryDone(result) => {
                self.state.history_pending = false;
                match result {
                    Ok(transaction) => self.state.last_transaction = transaction,
                    Err(error) => {
                        // Recency selection degrades to best-of; not an error
                        // the user needs to see.
                        debug!(%error, "Latest transaction lookup failed");
                    }
                }
            }
            Event::QuotesDone { generation, result } => {
                if generation != self.quote_generation {
                    debug!(generation, current = self.quote_generation, "Dropping stale quote fetch");
                } else {
                    self.state
                        .quotes
                        .finish(result.map(|quotes| QuoteSet::new(generation, quotes)));
                }
            }
            Event::ProvidersDone { generation, result } => {
                if generation != self.directory_generation {
                    debug!(generation, current = self.directory_generation, "Dropping stale provider fetch");
                } else {
                    self.state
                        .providers
                        .finish(result.map(|providers| ProviderSet::new(generation, providers)));
                }
            }
            Event::CurrenciesDone { generation, result } => {
                if generation != self.directory_generation {
                    debug!(generation, current = self.directory_generation, "Dropping stale currency fetch");
                } else {
                    self.state.currencies.finish(result);
                }
            }
        }

        self.after_apply();
    }

    /// Re-derives everything downstream of the raw snapshots and kicks off
    /// whatever fetches the current parameters call for.
    fn after_apply(&mut self) {
        self.refresh_directory();
        self.refresh_spend_currency();
        self.refresh_quotes();

        self.state.selection = reconcile(
            self.state.quotes.data.as_ref(),
            self.state.last_transaction.as_ref(),
            &self.state.selection,
        );
        if should_clear(
            self.state.quotes.data.as_ref(),
            self.state.quotes.has_error(),
            self.state.providers.has_error(),
            self.state.params.debounced_amount,
        ) {
            self.state.selection = SelectionState::cleared();
        }

        self.state.notice = classify_notice(
            self.state.region_unsupported,
            self.state.quotes.error.as_deref(),
            self.state.providers.error.as_deref(),
        );
        self.state.continue_enabled = continue_enabled(
            self.state.providers.loading,
            self.state.providers.has_error(),
            self.state.quote_refresh_pending(),
            self.state.quotes.has_error(),
            self.state
                .selection
                .quote
                .as_ref()
                .map(|q| q.destination_amount),
        );

        if let (Some(providers), Some(quotes)) = (
            self.state.providers.data.as_ref(),
            self.state.quotes.data.as_ref(),
        ) {
            self.prefetcher.warm_for(providers, quotes);
        }
    }

    fn refresh_directory(&mut self) {
        let Some(country) = self.state.params.country.clone() else {
            return;
        };
        if self.directory_country.as_deref() == Some(country.as_str()) {
            return;
        }
        self.directory_country = Some(country.clone());
        self.directory_generation += 1;
        let generation = self.directory_generation;
        self.state.providers = FetchState::loading();
        self.state.currencies = FetchState::loading();

        let directory = Arc::clone(&self.collaborators.providers);
        let events = self.events.clone();
        let for_country = country.clone();
        tokio::spawn(async move {
            let result = directory
                .fetch_providers(&for_country)
                .await
                .map_err(|e| format!("{e:#}"));
            let _ = events.send(Event::ProvidersDone { generation, result });
        });

        let currencies = Arc::clone(&self.collaborators.currencies);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = currencies
                .supported_fiat(&country)
                .await
                .map_err(|e| format!("{e:#}"));
            let _ = events.send(Event::CurrenciesDone { generation, result });
        });
    }

    fn refresh_spend_currency(&mut self) {
        let (currency, eligible) = select_fiat(
            self.state.currencies.data.as_deref(),
            &self.config.preferred_currency,
        );
        self.state.region_unsupported = self
            .state
            .currencies
            .data
            .as_ref()
            .is_some_and(|list| list.is_empty());
        self.state.spend_currency = currency;
        self.state.preferred_currency_eligible = eligible;
    }

    fn refresh_quotes(&mut self) {
        let desired = match (
            self.state.params.country.as_ref(),
            self.state.params.debounced_amount,
        ) {
            (Some(country), amount) if !amount.is_zero() => Some(QuoteRequest {
                amount,
                source_currency: self.state.spend_currency.code.clone(),
                destination_currency: self.state.params.token.clone(),
                country: country.clone(),
                region: self.state.params.region.clone(),
            }),
            _ => None,
        };
        if desired == self.quote_key {
            return;
        }
        self.quote_key = desired.clone();
        // Bumping the generation orphans any in-flight fetch for the old key.
        self.quote_generation += 1;
        let generation = self.quote_generation;

        match desired {
            Some(request) => {
                self.state.quotes = FetchState::loading();
                let source = Arc::clone(&self.collaborators.quotes);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = source
                        .fetch_quotes(&request)
                        .await
                        .map_err(|e| format!("{e:#}"));
                    let _ = events.send(Event::QuotesDone { generation, result });
                });
            }
            None => {
                self.state.quotes = FetchState::idle();
            }
        }
    }

    /// Publishes the snapshot; true once nobody is listening anymore.
    fn publish_snapshot(&self) -> bool {
        self.publish.send_replace(self.state.clone());
        self.publish.is_closed()
    }
}

fn parse_amount(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|amount| !amount.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::core::ProviderLogos;
    use crate::selection::SelectionRule;

    const SETTLE: Duration = Duration::from_secs(30);

    fn quote(provider: &str, destination: i64) -> Quote {
        Quote {
            service_provider: provider.to_string(),
            source_amount: Decimal::from(100),
            source_currency: "USD".to_string(),
            destination_amount: Decimal::from(destination),
            destination_currency: "ETH".to_string(),
            total_fee: None,
            exchange_rate: None,
        }
    }

    fn provider(id: &str) -> ServiceProvider {
        ServiceProvider {
            id: id.to_string(),
            name: id.to_string(),
            url: None,
            logos: ProviderLogos {
                light: Some(format!("https://cdn/{id}.png")),
                dark: None,
            },
        }
    }

    struct StaticQuotes {
        quotes: Vec<Quote>,
        hits: AtomicUsize,
    }

    impl StaticQuotes {
        fn new(quotes: Vec<Quote>) -> Arc<Self> {
            Arc::new(Self {
                quotes,
                hits: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuoteSource for StaticQuotes {
        async fn fetch_quotes(&self, _request: &QuoteRequest) -> Result<Vec<Quote>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(self.quotes.clone())
        }
    }

    struct FailingQuotes;

    #[async_trait]
    impl QuoteSource for FailingQuotes {
        async fn fetch_quotes(&self, _request: &QuoteRequest) -> Result<Vec<Quote>> {
            Err(anyhow!("quote service unavailable"))
        }
    }

    /// Quotes keyed by country, with per-country latency; exercises the
    /// stale-generation discard.
    struct CountryQuotes;

    #[async_trait]
    impl QuoteSource for CountryQuotes {
        async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>> {
            let (delay, provider) = match request.country.as_str() {
                "US" => (Duration::from_millis(200), "US_PROVIDER"),
                _ => (Duration::from_millis(10), "DE_PROVIDER"),
            };
            tokio::time::sleep(delay).await;
            Ok(vec![quote(provider, 100)])
        }
    }

    struct StaticDirectory {
        providers: Vec<ServiceProvider>,
    }

    #[async_trait]
    impl ProviderDirectory for StaticDirectory {
        async fn fetch_providers(&self, _country: &str) -> Result<Vec<ServiceProvider>> {
            Ok(self.providers.clone())
        }
    }

    struct StaticCurrencies {
        currencies: Vec<FiatCurrency>,
    }

    #[async_trait]
    impl CurrencySupport for StaticCurrencies {
        async fn supported_fiat(&self, _country: &str) -> Result<Vec<FiatCurrency>> {
            Ok(self.currencies.clone())
        }
    }

    struct StaticHistory {
        transaction: Option<PastTransaction>,
    }

    #[async_trait]
    impl TransactionHistory for StaticHistory {
        async fn latest_transaction(&self) -> Result<Option<PastTransaction>> {
            Ok(self.transaction.clone())
        }
    }

    struct StaticGeo {
        country: Option<DetectedCountry>,
    }

    #[async_trait]
    impl Geolocator for StaticGeo {
        async fn detect_country(&self) -> Result<DetectedCountry> {
            self.country
                .clone()
                .ok_or_else(|| anyhow!("geolocation unavailable"))
        }
    }

    struct RecordingImageCache {
        warmed: Mutex<Vec<String>>,
    }

    impl RecordingImageCache {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                warmed: Mutex::new(Vec::new()),
            })
        }

        fn warmed(&self) -> Vec<String> {
            self.warmed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageCache for RecordingImageCache {
        async fn warm(&self, uri: &str) -> Result<()> {
            self.warmed.lock().unwrap().push(uri.to_string());
            Ok(())
        }
    }

    fn collaborators(quotes: Arc<dyn QuoteSource>) -> Collaborators {
        Collaborators {
            quotes,
            providers: Arc::new(StaticDirectory {
                providers: vec![provider("P1"), provider("P2")],
            }),
            currencies: Arc::new(StaticCurrencies {
                currencies: vec![FiatCurrency::usd()],
            }),
            history: Arc::new(StaticHistory { transaction: None }),
            geo: Arc::new(StaticGeo { country: None }),
            images: RecordingImageCache::new(),
        }
    }

    fn config(amount: &str) -> SessionConfig {
        SessionConfig {
            amount: amount.to_string(),
            country: Some("US".to_string()),
            debounce: Duration::from_millis(100),
            ..SessionConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_on_best_quote() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100), quote("P2", 150)]);
        let session = QuoteSession::spawn(collaborators(quotes), config("100"));

        let state = session.settled(SETTLE).await.unwrap();

        assert_eq!(state.selection.rule, Some(SelectionRule::Best));
        assert_eq!(state.selection.quote, Some(quote("P2", 150)));
        assert!(state.continue_enabled);
        assert!(state.notice.is_none());
        assert_eq!(state.selection.sections.as_ref().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_provider_wins_and_is_isolated() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100), quote("P2", 150)]);
        let mut collaborators = collaborators(quotes);
        collaborators.history = Arc::new(StaticHistory {
            transaction: Some(PastTransaction {
                service_provider: Some("P1".to_string()),
                destination_currency: None,
                created_at: None,
            }),
        });
        let session = QuoteSession::spawn(collaborators, config("100"));

        let state = session.settled(SETTLE).await.unwrap();

        assert_eq!(state.selection.rule, Some(SelectionRule::MostRecent));
        assert_eq!(state.selection.quote, Some(quote("P1", 100)));
        let sections = state.selection.sections.as_ref().unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].most_recent);
        assert!(state.continue_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_error_clears_and_disables() {
        let session = QuoteSession::spawn(collaborators(Arc::new(FailingQuotes)), config("100"));

        let state = session.settled(SETTLE).await.unwrap();

        assert!(state.selection.quote.is_none());
        assert!(state.selection.sections.is_none());
        assert!(!state.continue_enabled);
        assert!(matches!(
            state.notice,
            Some(FlowNotice::FetchFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_unsupported_outranks_fetch_errors() {
        let mut collaborators = collaborators(Arc::new(FailingQuotes));
        collaborators.currencies = Arc::new(StaticCurrencies { currencies: vec![] });
        let session = QuoteSession::spawn(collaborators, config("100"));

        let state = session.settled(SETTLE).await.unwrap();

        assert!(state.region_unsupported);
        assert_eq!(state.notice, Some(FlowNotice::RegionUnsupported));
        assert!(!state.continue_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_amount_never_fetches() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let session = QuoteSession::spawn(collaborators(quotes.clone()), config("0"));

        let state = session.settled(SETTLE).await.unwrap();

        assert!(state.selection.quote.is_none());
        assert!(!state.continue_enabled);
        assert_eq!(quotes.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_quote_set_yields_no_selection() {
        let quotes = StaticQuotes::new(vec![]);
        let session = QuoteSession::spawn(collaborators(quotes), config("50"));

        let state = session.settled(SETTLE).await.unwrap();

        assert!(state.selection.quote.is_none());
        assert!(state.selection.sections.is_none());
        assert!(!state.continue_enabled);
        // Zero quotes is not an error.
        assert!(state.notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_fetches_once() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let session = QuoteSession::spawn(collaborators(quotes.clone()), config(""));
        session.settled(SETTLE).await.unwrap();

        session.set_amount("1");
        session.set_amount("12");
        session.set_amount("125");
        let state = session.settled(SETTLE).await.unwrap();

        assert_eq!(quotes.hits.load(Ordering::SeqCst), 1);
        assert_eq!(state.params.debounced_amount, Decimal::from(125));
        assert_eq!(state.selection.quote, Some(quote("P1", 100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_amount_drops_the_selection() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let session = QuoteSession::spawn(collaborators(quotes), config("100"));
        let state = session.settled(SETTLE).await.unwrap();
        assert!(state.selection.quote.is_some());

        session.set_amount("");
        let state = session.settled(SETTLE).await.unwrap();

        assert!(state.selection.quote.is_none());
        assert!(state.selection.sections.is_none());
        assert!(!state.continue_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_discarded() {
        let session = QuoteSession::spawn(collaborators(Arc::new(CountryQuotes)), config("100"));
        // Supersede the US fetch before it completes; the slower US result
        // must not overwrite the DE one.
        session.set_country("DE");

        let state = session.settled(SETTLE).await.unwrap();
        assert_eq!(state.selection.quote, Some(quote("DE_PROVIDER", 100)));

        tokio::time::sleep(Duration::from_millis(300)).await;
        let state = session.snapshot();
        assert_eq!(state.selection.quote, Some(quote("DE_PROVIDER", 100)));
        assert_eq!(state.params.country.as_deref(), Some("DE"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_geolocation_failure_falls_back() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let mut config = config("100");
        config.country = None;
        config.fallback_country = "GB".to_string();
        let session = QuoteSession::spawn(collaborators(quotes), config);

        let state = session.settled(SETTLE).await.unwrap();

        assert_eq!(state.params.country.as_deref(), Some("GB"));
        assert!(state.selection.quote.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_geolocation_seeds_country_and_region() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let mut collaborators = collaborators(quotes);
        collaborators.geo = Arc::new(StaticGeo {
            country: Some(DetectedCountry {
                country_code: "US".to_string(),
                state: Some("NY".to_string()),
            }),
        });
        let mut config = config("100");
        config.country = None;
        let session = QuoteSession::spawn(collaborators, config);

        let state = session.settled(SETTLE).await.unwrap();

        assert_eq!(state.params.country.as_deref(), Some("US"));
        assert_eq!(state.params.region.as_deref(), Some("NY"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logos_warm_for_quoted_providers_only() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let images = RecordingImageCache::new();
        let mut collaborators = collaborators(quotes);
        collaborators.images = images.clone();
        let session = QuoteSession::spawn(collaborators, config("100"));

        session.settled(SETTLE).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // P2 is eligible but produced no quote.
        assert_eq!(images.warmed(), vec!["https://cdn/P1.png".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_preference_spends_usd() {
        let quotes = StaticQuotes::new(vec![quote("P1", 100)]);
        let mut collaborators = collaborators(quotes);
        collaborators.currencies = Arc::new(StaticCurrencies {
            currencies: vec![FiatCurrency::new("EUR")],
        });
        let mut config = config("100");
        config.preferred_currency = "INR".to_string();
        let session = QuoteSession::spawn(collaborators, config);

        let state = session.settled(SETTLE).await.unwrap();

        assert_eq!(state.spend_currency.code, "USD");
        assert!(!state.preferred_currency_eligible);
        assert!(!state.region_unsupported);
    }
}
