//! Domain types and collaborator seams

pub mod currency;
pub mod directory;
pub mod geo;
pub mod history;
pub mod image;
pub mod quote;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use currency::{CryptoCurrency, CurrencySupport, FiatCurrency};
pub use directory::{LogoTheme, ProviderDirectory, ProviderLogos, ProviderSet, ServiceProvider};
pub use geo::{DetectedCountry, Geolocator};
pub use history::{PastTransaction, TransactionHistory};
pub use image::ImageCache;
pub use quote::{Quote, QuoteRequest, QuoteSet, QuoteSource};
pub use snapshot::FetchState;
