//! Best-effort provider logo warm-up

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::core::{ImageCache, LogoTheme, ProviderSet, Quote, QuoteSet, ServiceProvider};

/// Warms the image cache for the providers that actually appear in the
/// current quote set, so the provider picker renders their logos instantly.
///
/// Strictly fire-and-forget: warm-ups run detached, failures are logged at
/// debug and never surfaced, and each `(provider set, quote set)` pair is
/// warmed at most once.
pub struct LogoPrefetcher {
    images: Arc<dyn ImageCache>,
    theme: LogoTheme,
    warmed: HashSet<(u64, u64)>,
}

impl LogoPrefetcher {
    pub fn new(images: Arc<dyn ImageCache>, theme: LogoTheme) -> Self {
        Self {
            images,
            theme,
            warmed: HashSet::new(),
        }
    }

    pub fn warm_for(&mut self, providers: &ProviderSet, quotes: &QuoteSet) {
        if !self.warmed.insert((providers.fetch_id, quotes.fetch_id)) {
            return;
        }

        let uris = quoted_logo_uris(&providers.providers, &quotes.quotes, self.theme);
        if uris.is_empty() {
            return;
        }

        debug!(count = uris.len(), "Warming provider logos");
        let images = Arc::clone(&self.images);
        tokio::spawn(async move {
            let results = join_all(uris.iter().map(|uri| images.warm(uri))).await;
            for (uri, result) in uris.iter().zip(results) {
                if let Err(error) = result {
                    debug!(%uri, %error, "Logo warm-up failed");
                }
            }
        });
    }
}

/// Logo URIs for the providers present in the quote set; providers without a
/// resolvable logo for the theme are dropped.
pub fn quoted_logo_uris(
    providers: &[ServiceProvider],
    quotes: &[Quote],
    theme: LogoTheme,
) -> Vec<String> {
    let quoted: HashSet<&str> = quotes
        .iter()
        .map(|q| q.service_provider.as_str())
        .collect();
    providers
        .iter()
        .filter(|sp| quoted.contains(sp.id.as_str()))
        .filter_map(|sp| sp.logos.uri(theme).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    use crate::core::ProviderLogos;

    struct RecordingImageCache {
        warmed: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingImageCache {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                warmed: Mutex::new(Vec::new()),
                fail,
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
            if self.fail {
                return Err(anyhow!("image fetch failed"));
            }
            Ok(())
        }
    }

    fn provider(id: &str, light: Option<&str>) -> ServiceProvider {
        ServiceProvider {
            id: id.to_string(),
            name: id.to_string(),
            url: None,
            logos: ProviderLogos {
                light: light.map(str::to_string),
                dark: None,
            },
        }
    }

    fn quote(provider: &str) -> Quote {
        Quote {
            service_provider: provider.to_string(),
            source_amount: Decimal::from(100),
            source_currency: "USD".to_string(),
            destination_amount: Decimal::from(1),
            destination_currency: "ETH".to_string(),
            total_fee: None,
            exchange_rate: None,
        }
    }

    #[test]
    fn test_uris_restricted_to_quoted_providers() {
        let providers = vec![
            provider("P1", Some("https://cdn/p1.png")),
            provider("P2", Some("https://cdn/p2.png")),
            provider("P3", None),
        ];
        let quotes = vec![quote("P1"), quote("P3")];

        let uris = quoted_logo_uris(&providers, &quotes, LogoTheme::Light);

        // P2 has no quote, P3 has no resolvable logo.
        assert_eq!(uris, vec!["https://cdn/p1.png".to_string()]);
    }

    #[test]
    fn test_theme_picks_the_matching_variant() {
        let mut sp = provider("P1", Some("https://cdn/light.png"));
        sp.logos.dark = Some("https://cdn/dark.png".to_string());

        let uris = quoted_logo_uris(std::slice::from_ref(&sp), &[quote("P1")], LogoTheme::Dark);
        assert_eq!(uris, vec!["https://cdn/dark.png".to_string()]);
    }

    #[tokio::test]
    async fn test_warms_each_pair_once() {
        let images = RecordingImageCache::new(false);
        let mut prefetcher = LogoPrefetcher::new(images.clone(), LogoTheme::Light);

        let providers = ProviderSet::new(1, vec![provider("P1", Some("https://cdn/p1.png"))]);
        let quotes = QuoteSet::new(1, vec![quote("P1")]);

        prefetcher.warm_for(&providers, &quotes);
        prefetcher.warm_for(&providers, &quotes);
        tokio::task::yield_now().await;
        assert_eq!(images.warmed().len(), 1);

        // A new quote fetch forms a new pair and warms again.
        let newer = QuoteSet::new(2, vec![quote("P1")]);
        prefetcher.warm_for(&providers, &newer);
        tokio::task::yield_now().await;
        assert_eq!(images.warmed().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_stay_silent() {
        let images = RecordingImageCache::new(true);
        let mut prefetcher = LogoPrefetcher::new(images.clone(), LogoTheme::Light);

        let providers = ProviderSet::new(1, vec![provider("P1", Some("https://cdn/p1.png"))]);
        let quotes = QuoteSet::new(1, vec![quote("P1")]);

        prefetcher.warm_for(&providers, &quotes);
        tokio::task::yield_now().await;
        assert_eq!(images.warmed().len(), 1);
    }
}
