use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Contract record exactly as the provider sent it.
/// Fields may be absent or live under alternate keys; the normalizer sorts that out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawContract(pub Value);

impl RawContract {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// First of `keys` present with a non-null value
    pub fn field(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !value.is_null())
    }
}

/// Where the reference stock price comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    /// last trade -> snapshot -> previous close
    #[default]
    Auto,
    PreviousClose,
}

impl FromStr for PriceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "realtime" => Ok(PriceMode::Auto),
            "previous_close" | "previous-close" | "prev" | "prev_close" => Ok(PriceMode::PreviousClose),
            other => Err(format!("Unknown price source '{}'", other)),
        }
    }
}

impl fmt::Display for PriceMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PriceMode::Auto => write!(f, "auto"),
            PriceMode::PreviousClose => write!(f, "previous_close"),
        }
    }
}

/// Metric the result table is ranked by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    ReturnIfAssigned,
    DownsideProtection,
    AnnualizedRoi,
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::ReturnIfAssigned => "Return if Assigned %",
            SortKey::DownsideProtection => "Downside Protection %",
            SortKey::AnnualizedRoi => "Annualized ROI %",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "return_if_assigned" | "return" => Ok(SortKey::ReturnIfAssigned),
            "downside_protection" | "downside" => Ok(SortKey::DownsideProtection),
            "annualized_roi" | "roi" => Ok(SortKey::AnnualizedRoi),
            other => Err(format!("Unknown sort key '{}'", other)),
        }
    }
}

/// What to do when the options chain request itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainErrorPolicy {
    /// Any fetch failure reads as an empty chain
    #[default]
    Collapse,
    /// The classified fetch error becomes the ticker's error
    Surface,
}

/// User thresholds applied by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenFilters {
    pub dte_min: i64,
    pub dte_max: i64,
    pub min_open_interest: u64,
    pub min_premium: f64,
    pub min_annualized_roi: f64,
}

impl Default for ScreenFilters {
    fn default() -> Self {
        use super::config;
        Self {
            dte_min: config::DEFAULT_DTE_MIN,
            dte_max: config::DEFAULT_DTE_MAX,
            min_open_interest: config::DEFAULT_MIN_OPEN_INTEREST,
            min_premium: config::DEFAULT_MIN_PREMIUM,
            min_annualized_roi: config::DEFAULT_MIN_ANNUALIZED_ROI,
        }
    }
}

/// One screening pass as requested by the input surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRequest {
    pub tickers: Vec<String>,
    pub filters: ScreenFilters,
    pub price_mode: PriceMode,
    pub sort_key: SortKey,
}

/// Normalized fields of a contract that passed required-field extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractCandidate {
    pub strike: f64,
    pub expiration: NaiveDate,
    pub dte: i64,
    pub open_interest: u64,
    pub bid: f64,
}

/// A qualifying covered call. Built only by the evaluator, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    ticker: String,
    stock_price: f64,
    strike: f64,
    expiration: NaiveDate,
    dte: i64,
    premium: f64,
    return_if_assigned_pct: f64,
    breakeven: f64,
    downside_protection_pct: f64,
    annualized_roi_pct: f64,
    open_interest: u64,
}

impl Opportunity {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ticker: String,
        stock_price: f64,
        strike: f64,
        expiration: NaiveDate,
        dte: i64,
        premium: f64,
        return_if_assigned_pct: f64,
        breakeven: f64,
        downside_protection_pct: f64,
        annualized_roi_pct: f64,
        open_interest: u64,
    ) -> Self {
        Self {
            ticker,
            stock_price,
            strike,
            expiration,
            dte,
            premium,
            return_if_assigned_pct,
            breakeven,
            downside_protection_pct,
            annualized_roi_pct,
            open_interest,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn stock_price(&self) -> f64 {
        self.stock_price
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    pub fn dte(&self) -> i64 {
        self.dte
    }

    pub fn premium(&self) -> f64 {
        self.premium
    }

    pub fn return_if_assigned_pct(&self) -> f64 {
        self.return_if_assigned_pct
    }

    pub fn breakeven(&self) -> f64 {
        self.breakeven
    }

    pub fn downside_protection_pct(&self) -> f64 {
        self.downside_protection_pct
    }

    pub fn annualized_roi_pct(&self) -> f64 {
        self.annualized_roi_pct
    }

    pub fn open_interest(&self) -> u64 {
        self.open_interest
    }

    /// Profit per 100-share lot if called away at expiration
    pub fn profit_if_assigned(&self) -> f64 {
        (self.strike - self.stock_price + self.premium) * 100.0
    }

    pub fn metric(&self, key: SortKey) -> f64 {
        match key {
            SortKey::ReturnIfAssigned => self.return_if_assigned_pct,
            SortKey::DownsideProtection => self.downside_protection_pct,
            SortKey::AnnualizedRoi => self.annualized_roi_pct,
        }
    }
}

/// Why a single contract did not make it into the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingStrike,
    MissingExpiration,
    MissingOpenInterest,
    UnparsableStrike,
    UnparsableExpiration,
    UnparsableOpenInterest,
    Expired,
    NoBid,
    DteOutOfRange,
    NotInTheMoney,
    LowOpenInterest,
    ZeroDte,
    PremiumBelowMin,
    RoiBelowMin,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            SkipReason::MissingStrike => "missing strike",
            SkipReason::MissingExpiration => "missing expiration",
            SkipReason::MissingOpenInterest => "missing open interest",
            SkipReason::UnparsableStrike => "unparsable strike",
            SkipReason::UnparsableExpiration => "unparsable expiration",
            SkipReason::UnparsableOpenInterest => "unparsable open interest",
            SkipReason::Expired => "already expired",
            SkipReason::NoBid => "no usable bid",
            SkipReason::DteOutOfRange => "DTE outside range",
            SkipReason::NotInTheMoney => "strike not below price",
            SkipReason::LowOpenInterest => "open interest below minimum",
            SkipReason::ZeroDte => "expires today",
            SkipReason::PremiumBelowMin => "premium below minimum",
            SkipReason::RoiBelowMin => "annualized ROI below minimum",
        };
        write!(f, "{}", text)
    }
}

/// Skip counts per reason, accumulated across a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkipStats {
    pub counts: BTreeMap<SkipReason, usize>,
}

impl SkipStats {
    pub fn record(&mut self, reason: SkipReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &SkipStats) {
        for (reason, count) in &other.counts {
            *self.counts.entry(*reason).or_insert(0) += count;
        }
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Result of processing one ticker
#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    pub ticker: String,
    pub stock_price: f64,
    pub contracts_seen: usize,
    pub opportunities: Vec<Opportunity>,
    pub skipped: SkipStats,
}

/// Aggregate of one screening run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScreenReport {
    pub opportunities: Vec<Opportunity>,
    pub errors: Vec<String>,
    pub aborted: bool,
    pub skipped: SkipStats,
}

#[cfg(test)]
impl Opportunity {
    /// Shorthand for ranking/formatting tests
    pub(crate) fn sample(ticker: &str, return_pct: f64, downside_pct: f64, annualized_pct: f64) -> Self {
        Self::new(
            ticker.to_string(),
            100.0,
            95.0,
            NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            30,
            2.0,
            return_pct,
            98.0,
            downside_pct,
            annualized_pct,
            500,
        )
    }
}
