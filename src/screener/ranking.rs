use super::models::{Opportunity, SortKey};
use serde::Serialize;
use std::cmp::Ordering;

/// Display order of the result table
pub const COLUMNS: [&str; 11] = [
    "Ticker",
    "Stock Price",
    "Strike",
    "Expiration",
    "DTE",
    "Premium",
    "Return if Assigned %",
    "Breakeven",
    "Downside Protection %",
    "Annualized ROI %",
    "Open Interest",
];

/// Sort descending by the chosen metric; ties go ticker, expiration, strike ascending
pub fn rank(mut opportunities: Vec<Opportunity>, sort_key: SortKey) -> Vec<Opportunity> {
    opportunities.sort_by(|a, b| compare(a, b, sort_key));
    opportunities
}

fn compare(a: &Opportunity, b: &Opportunity, sort_key: SortKey) -> Ordering {
    b.metric(sort_key)
        .total_cmp(&a.metric(sort_key))
        .then_with(|| a.ticker().cmp(b.ticker()))
        .then_with(|| a.expiration().cmp(&b.expiration()))
        .then_with(|| a.strike().total_cmp(&b.strike()))
}

// -----------------------------------------------
// PRESENTATION
// -----------------------------------------------

/// String rendering of one opportunity, used for display only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedOpportunity {
    pub ticker: String,
    pub stock_price: String,
    pub strike: String,
    pub expiration: String,
    pub dte: String,
    pub premium: String,
    pub return_if_assigned_pct: String,
    pub breakeven: String,
    pub downside_protection_pct: String,
    pub annualized_roi_pct: String,
    pub open_interest: String,
}

impl FormattedOpportunity {
    pub fn from_opportunity(opp: &Opportunity) -> Self {
        Self {
            ticker: opp.ticker().to_string(),
            stock_price: format_currency(opp.stock_price()),
            strike: format_currency(opp.strike()),
            expiration: opp.expiration().format("%Y-%m-%d").to_string(),
            dte: opp.dte().to_string(),
            premium: format_currency(opp.premium()),
            return_if_assigned_pct: format_percent(opp.return_if_assigned_pct()),
            breakeven: format_currency(opp.breakeven()),
            downside_protection_pct: format_percent(opp.downside_protection_pct()),
            annualized_roi_pct: format_percent(opp.annualized_roi_pct()),
            open_interest: opp.open_interest().to_string(),
        }
    }

    /// Cells in `COLUMNS` order
    pub fn cells(&self) -> [&str; 11] {
        [
            &self.ticker,
            &self.stock_price,
            &self.strike,
            &self.expiration,
            &self.dte,
            &self.premium,
            &self.return_if_assigned_pct,
            &self.breakeven,
            &self.downside_protection_pct,
            &self.annualized_roi_pct,
            &self.open_interest,
        ]
    }
}

pub fn format_all(opportunities: &[Opportunity]) -> Vec<FormattedOpportunity> {
    opportunities.iter().map(FormattedOpportunity::from_opportunity).collect()
}

/// Unformatted cells in `COLUMNS` order (raw mode)
pub fn raw_cells(opp: &Opportunity) -> [String; 11] {
    [
        opp.ticker().to_string(),
        opp.stock_price().to_string(),
        opp.strike().to_string(),
        opp.expiration().format("%Y-%m-%d").to_string(),
        opp.dte().to_string(),
        opp.premium().to_string(),
        opp.return_if_assigned_pct().to_string(),
        opp.breakeven().to_string(),
        opp.downside_protection_pct().to_string(),
        opp.annualized_roi_pct().to_string(),
        opp.open_interest().to_string(),
    ]
}

/// `$1,234.56`, negatives as `-$1,234.56`
pub fn format_currency(value: f64) -> String {
    let (sign, digits) = split_two_decimals(value);
    format!("{}${}", sign, digits)
}

/// `1,234.56%`
pub fn format_percent(value: f64) -> String {
    let (sign, digits) = split_two_decimals(value);
    format!("{}{}%", sign, digits)
}

fn split_two_decimals(value: f64) -> (&'static str, String) {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to 0.00 and prints without a sign
    let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    (sign, format!("{}.{}", grouped, frac))
}
