#![allow(dead_code)]

use chrono::NaiveDate;
use covered_call_screener::screener::{MarketData, RawContract, ScreenerError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

/// Call contract shaped like the provider's reference payload
pub fn call(strike: f64, expiration: &str, open_interest: u64, bid: f64) -> RawContract {
    RawContract::new(json!({
        "ticker": format!("O:TEST{}C{}", expiration, strike),
        "strike_price": strike,
        "expiration_date": expiration,
        "open_interest": open_interest,
        "last_quote": { "bid": bid },
    }))
}

type PriceFixture = HashMap<String, Result<f64, ScreenerError>>;

/// In-memory provider; anything without a fixture fails with NoData
#[derive(Default)]
pub struct FakeProvider {
    last_trade: PriceFixture,
    snapshot: PriceFixture,
    previous_close: PriceFixture,
    chains: HashMap<String, Result<Vec<RawContract>, ScreenerError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_trade(mut self, ticker: &str, result: Result<f64, ScreenerError>) -> Self {
        self.last_trade.insert(ticker.to_string(), result);
        self
    }

    pub fn snapshot(mut self, ticker: &str, result: Result<f64, ScreenerError>) -> Self {
        self.snapshot.insert(ticker.to_string(), result);
        self
    }

    pub fn previous_close(mut self, ticker: &str, result: Result<f64, ScreenerError>) -> Self {
        self.previous_close.insert(ticker.to_string(), result);
        self
    }

    pub fn chain(mut self, ticker: &str, result: Result<Vec<RawContract>, ScreenerError>) -> Self {
        self.chains.insert(ticker.to_string(), result);
        self
    }

    /// Every price at every stage returns 401
    pub fn unauthorized(self, ticker: &str) -> Self {
        let err = || {
            Err(ScreenerError::Authentication(format!(
                "401 fetching last trade ({}): Unknown API Key (Invalid / missing API key?)",
                ticker
            )))
        };
        self.last_trade(ticker, err()).snapshot(ticker, err()).previous_close(ticker, err())
    }

    /// Calls seen so far, as "stage:TICKER"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, ticker: &str) -> usize {
        self.calls().iter().filter(|c| c.ends_with(&format!(":{}", ticker))).count()
    }

    fn record(&self, stage: &str, ticker: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", stage, ticker));
    }

    fn price(fixture: &PriceFixture, ticker: &str) -> Result<f64, ScreenerError> {
        fixture
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| Err(ScreenerError::NoData(format!("no fixture for {}", ticker))))
    }
}

impl MarketData for FakeProvider {
    async fn last_trade(&self, ticker: &str) -> Result<f64, ScreenerError> {
        self.record("last_trade", ticker);
        Self::price(&self.last_trade, ticker)
    }

    async fn snapshot_price(&self, ticker: &str) -> Result<f64, ScreenerError> {
        self.record("snapshot", ticker);
        Self::price(&self.snapshot, ticker)
    }

    async fn previous_close(&self, ticker: &str) -> Result<f64, ScreenerError> {
        self.record("previous_close", ticker);
        Self::price(&self.previous_close, ticker)
    }

    async fn call_chain(&self, ticker: &str) -> Result<Vec<RawContract>, ScreenerError> {
        self.record("call_chain", ticker);
        self.chains.get(ticker).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}
