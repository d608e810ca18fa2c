//! Rendering of session snapshots for the terminal
//!
//! Presentation only; every decision printed here was computed by the
//! selection engine and readiness predicates.

use comfy_table::Cell;

use crate::core::{CryptoCurrency, FiatCurrency, Quote, ServiceProvider};
use crate::readiness::FlowNotice;
use crate::selection::{QuoteSection, SelectionRule};
use crate::session::SessionState;
use crate::ui;

pub fn render_quote_board(state: &SessionState) -> String {
    let mut output = format!(
        "Buy {} with {}\n",
        ui::style_text(&state.params.token, ui::StyleType::Title),
        format_spend(&state.params.raw_amount, &state.spend_currency),
    );

    if !state.preferred_currency_eligible {
        output.push_str(&ui::style_text(
            &format!(
                "Your preferred currency is not supported here; amounts are in {}.\n",
                state.spend_currency.code
            ),
            ui::StyleType::Subtle,
        ));
    }

    if let Some(notice) = &state.notice {
        output.push('\n');
        output.push_str(&render_notice(notice));
        output.push('\n');
    }

    match &state.selection.sections {
        Some(sections) => {
            output.push('\n');
            output.push_str(&render_sections(
                sections,
                state.selection.quote.as_ref(),
                &state.params.token,
            ));
            output.push_str(&render_selection_summary(
                state.selection.quote.as_ref(),
                state.selection.rule,
                &state.params.token,
            ));
        }
        None if state.notice.is_none() => {
            output.push('\n');
            output.push_str(&ui::style_text(
                "No quotes for the current amount.",
                ui::StyleType::Subtle,
            ));
            output.push('\n');
        }
        None => {}
    }

    output.push('\n');
    output.push_str(&render_verdict(state.continue_enabled));
    output
}

pub fn render_provider_list(country: &str, providers: &[ServiceProvider]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Provider"),
        ui::header_cell("Name"),
        ui::header_cell("Url"),
        ui::header_cell("Logo"),
    ]);
    for provider in providers {
        let has_logo = provider.logos.light.is_some() || provider.logos.dark.is_some();
        table.add_row(vec![
            Cell::new(&provider.id),
            Cell::new(&provider.name),
            Cell::new(provider.url.as_deref().unwrap_or("N/A")),
            Cell::new(if has_logo { "yes" } else { "no" }),
        ]);
    }

    format!(
        "Service providers in {}\n\n{}",
        ui::style_text(country, ui::StyleType::Title),
        table
    )
}

pub fn render_token_list(country: &str, tokens: &[CryptoCurrency]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Token"), ui::header_cell("Name")]);
    for token in tokens {
        table.add_row(vec![
            Cell::new(&token.code),
            Cell::new(token.name.as_deref().unwrap_or("N/A")),
        ]);
    }

    format!(
        "Purchasable assets in {}\n\n{}",
        ui::style_text(country, ui::StyleType::Title),
        table
    )
}

fn format_spend(raw_amount: &str, currency: &FiatCurrency) -> String {
    let symbol = currency.symbol.as_deref().unwrap_or("");
    let amount = if raw_amount.is_empty() { "0" } else { raw_amount };
    format!("{symbol}{amount} {}", currency.code)
}

fn render_notice(notice: &FlowNotice) -> String {
    match notice {
        FlowNotice::RegionUnsupported => ui::style_text(
            "Purchasing crypto is not available in your region.",
            ui::StyleType::Warning,
        ),
        FlowNotice::FetchFailed { message } => ui::style_text(
            &format!("Unable to fetch quotes: {message}"),
            ui::StyleType::Error,
        ),
    }
}

fn render_sections(
    sections: &[QuoteSection],
    selected: Option<&Quote>,
    token: &str,
) -> String {
    let mut output = String::new();
    for section in sections {
        if section.most_recent {
            output.push_str(&ui::style_text("Recently used", ui::StyleType::SectionLabel));
            output.push('\n');
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell(""),
            ui::header_cell("Provider"),
            ui::header_cell(&format!("{token} received")),
            ui::header_cell("Rate"),
            ui::header_cell("Fee"),
        ]);
        for quote in &section.quotes {
            let marker = if selected == Some(quote) {
                Cell::new(ui::style_text("▸", ui::StyleType::Selected))
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                marker,
                Cell::new(&quote.service_provider),
                ui::amount_cell(&quote.destination_amount.to_string()),
                ui::format_optional_cell(quote.exchange_rate, |r| format!("{r:.2}")),
                ui::format_optional_cell(quote.total_fee, |f| format!("{f:.2}")),
            ]);
        }
        output.push_str(&table.to_string());
        output.push_str("\n\n");
    }
    output
}

fn render_selection_summary(
    selected: Option<&Quote>,
    rule: Option<SelectionRule>,
    token: &str,
) -> String {
    let Some(quote) = selected else {
        return String::new();
    };
    let reason = match rule {
        Some(SelectionRule::MostRecent) => "your last used provider",
        Some(SelectionRule::Best) => "the best rate",
        None => "no rule",
    };
    format!(
        "Selected {} ({reason}): {} {token} for {} {}\n",
        ui::style_text(&quote.service_provider, ui::StyleType::Selected),
        quote.destination_amount,
        quote.source_amount,
        quote.source_currency,
    )
}

fn render_verdict(continue_enabled: bool) -> String {
    if continue_enabled {
        format!(
            "Ready to continue: {}",
            ui::style_text("yes", ui::StyleType::Enabled)
        )
    } else {
        format!(
            "Ready to continue: {}",
            ui::style_text("no", ui::StyleType::Disabled)
        )
    }
}
