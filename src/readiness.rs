//! Continue gating and user-facing notice classification

use rust_decimal::Decimal;

use crate::core::FiatCurrency;

/// Whether the user may proceed to checkout with the selected quote.
///
/// A pure conjunction of negatives: any one signal disables, all five must be
/// clear to enable. `quote_refresh_pending` covers both an in-flight quote
/// fetch and the debounce window where the typed amount has not settled yet.
pub fn continue_enabled(
    providers_loading: bool,
    providers_error: bool,
    quote_refresh_pending: bool,
    quotes_error: bool,
    selected_destination: Option<Decimal>,
) -> bool {
    !(providers_loading
        || providers_error
        || quote_refresh_pending
        || quotes_error
        || selected_destination.is_none_or(|amount| amount.is_zero()))
}

/// The single message the flow surfaces, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowNotice {
    /// No fiat currency is eligible in the detected country. Not an error;
    /// outranks and suppresses fetch-error display entirely.
    RegionUnsupported,
    /// A quote or provider fetch failed; transient and never fatal.
    FetchFailed { message: String },
}

pub fn classify_notice(
    region_unsupported: bool,
    quotes_error: Option<&str>,
    providers_error: Option<&str>,
) -> Option<FlowNotice> {
    if region_unsupported {
        return Some(FlowNotice::RegionUnsupported);
    }
    quotes_error
        .or(providers_error)
        .map(|message| FlowNotice::FetchFailed {
            message: message.to_string(),
        })
}

/// Picks the spend currency out of the country's eligible list.
///
/// Returns the preferred currency when it is eligible, otherwise the USD
/// fallback; the flag reports whether the preference held. An unloaded list
/// (`None`) assumes the preference optimistically so quoting need not wait on
/// the currency fetch.
pub fn select_fiat(
    supported: Option<&[FiatCurrency]>,
    preferred: &str,
) -> (FiatCurrency, bool) {
    let Some(supported) = supported else {
        return (FiatCurrency::new(preferred), true);
    };
    match supported
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(preferred))
    {
        Some(currency) => (currency.clone(), true),
        None => (FiatCurrency::usd(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_clear_enables() {
        assert!(continue_enabled(
            false,
            false,
            false,
            false,
            Some(Decimal::from(1))
        ));
    }

    #[test]
    fn test_any_single_signal_disables() {
        let amount = Some(Decimal::from(1));
        assert!(!continue_enabled(true, false, false, false, amount));
        assert!(!continue_enabled(false, true, false, false, amount));
        assert!(!continue_enabled(false, false, true, false, amount));
        assert!(!continue_enabled(false, false, false, true, amount));
        assert!(!continue_enabled(false, false, false, false, None));
        assert!(!continue_enabled(
            false,
            false,
            false,
            false,
            Some(Decimal::ZERO)
        ));
    }

    #[test]
    fn test_region_unsupported_suppresses_fetch_errors() {
        let notice = classify_notice(true, Some("quote fetch failed"), Some("directory down"));
        assert_eq!(notice, Some(FlowNotice::RegionUnsupported));
    }

    #[test]
    fn test_quote_error_outranks_provider_error() {
        let notice = classify_notice(false, Some("quote fetch failed"), Some("directory down"));
        assert_eq!(
            notice,
            Some(FlowNotice::FetchFailed {
                message: "quote fetch failed".to_string()
            })
        );

        let notice = classify_notice(false, None, Some("directory down"));
        assert_eq!(
            notice,
            Some(FlowNotice::FetchFailed {
                message: "directory down".to_string()
            })
        );
    }

    #[test]
    fn test_no_signals_no_notice() {
        assert_eq!(classify_notice(false, None, None), None);
    }

    #[test]
    fn test_select_fiat_prefers_eligible_preference() {
        let supported = vec![FiatCurrency::new("EUR"), FiatCurrency::new("GBP")];

        let (currency, preferred_held) = select_fiat(Some(supported.as_slice()), "eur");
        assert_eq!(currency.code, "EUR");
        assert!(preferred_held);
    }

    #[test]
    fn test_select_fiat_falls_back_to_usd() {
        let supported = vec![FiatCurrency::new("EUR")];

        let (currency, preferred_held) = select_fiat(Some(supported.as_slice()), "INR");
        assert_eq!(currency.code, "USD");
        assert!(!preferred_held);
    }

    #[test]
    fn test_select_fiat_is_optimistic_before_the_list_loads() {
        let (currency, preferred_held) = select_fiat(None, "EUR");
        assert_eq!(currency.code, "EUR");
        assert!(preferred_held);
    }
}
