//! Initial quote selection and reconciliation
//!
//! Pure derivation over collaborator snapshots. The session invokes
//! [`reconcile`] after every state change; the function itself decides whether
//! anything needs recomputing, so repeated calls with an unchanged quote set
//! never churn the selection.

use rust_decimal::Decimal;

use crate::core::{PastTransaction, Quote, QuoteSet};

/// The policy that produced the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    MostRecent,
    Best,
}

/// One display group of the quote board.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSection {
    pub quotes: Vec<Quote>,
    /// Set on the group holding the quote from the last-used provider.
    pub most_recent: bool,
}

/// The single authoritative quote, the segmented board it is displayed in,
/// and the rule that picked it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub quote: Option<Quote>,
    pub sections: Option<Vec<QuoteSection>>,
    pub rule: Option<SelectionRule>,
    /// `fetch_id` of the quote set the selection was computed from.
    pub source_set: Option<u64>,
}

impl SelectionState {
    pub fn cleared() -> Self {
        Self::default()
    }
}

/// Picks the quote a fresh set starts out selected on.
///
/// A quote from the provider of the user's most recent purchase wins outright;
/// no amount comparison happens in that case. Otherwise the quote with the
/// largest destination amount wins, the earliest one on ties.
pub fn select_initial_quote(
    quotes: &[Quote],
    last_transaction: Option<&PastTransaction>,
) -> Option<(usize, SelectionRule)> {
    if let Some(last_used) = last_transaction.and_then(|t| t.service_provider.as_deref()) {
        if let Some(index) = quotes
            .iter()
            .position(|q| q.service_provider == last_used)
        {
            return Some((index, SelectionRule::MostRecent));
        }
    }

    let mut best: Option<(usize, Decimal)> = None;
    for (index, quote) in quotes.iter().enumerate() {
        match best {
            // Strict comparison: the earliest maximal quote stays the winner.
            Some((_, amount)) if quote.destination_amount > amount => {
                best = Some((index, quote.destination_amount));
            }
            None => best = Some((index, quote.destination_amount)),
            _ => {}
        }
    }
    best.map(|(index, _)| (index, SelectionRule::Best))
}

/// Recomputes the selection when the quote set changed identity or nothing is
/// selected; otherwise returns the current state untouched.
///
/// A set that yields no selection (it is empty) also leaves the current state
/// untouched; dropping stale selections is [`should_clear`]'s job.
pub fn reconcile(
    quote_set: Option<&QuoteSet>,
    last_transaction: Option<&PastTransaction>,
    current: &SelectionState,
) -> SelectionState {
    let Some(set) = quote_set else {
        return current.clone();
    };
    if current.source_set == Some(set.fetch_id) && current.quote.is_some() {
        return current.clone();
    }

    let Some((index, rule)) = select_initial_quote(&set.quotes, last_transaction) else {
        return current.clone();
    };
    let selected = set.quotes[index].clone();

    let sections = match rule {
        SelectionRule::MostRecent => {
            let rest: Vec<Quote> = set
                .quotes
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, q)| q.clone())
                .collect();
            let mut sections = vec![QuoteSection {
                quotes: vec![selected.clone()],
                most_recent: true,
            }];
            if !rest.is_empty() {
                sections.push(QuoteSection {
                    quotes: rest,
                    most_recent: false,
                });
            }
            sections
        }
        // Original order; the best quote is identified via the selection, the
        // board is never re-sorted by amount.
        SelectionRule::Best => vec![QuoteSection {
            quotes: set.quotes.clone(),
            most_recent: false,
        }],
    };

    SelectionState {
        quote: Some(selected),
        sections: Some(sections),
        rule: Some(rule),
        source_set: Some(set.fetch_id),
    }
}

/// True when the inputs no longer support a quote: no usable set (absent or
/// zero-length), combined with a fetch error on either path or a settled
/// amount of zero. The caller drops both the selection and the board, even if
/// a previous selection would otherwise persist.
pub fn should_clear(
    quote_set: Option<&QuoteSet>,
    quotes_error: bool,
    providers_error: bool,
    debounced_amount: Decimal,
) -> bool {
    let no_quotes = quote_set.is_none_or(QuoteSet::is_empty);
    no_quotes && (quotes_error || providers_error || debounced_amount.is_zero())
}
