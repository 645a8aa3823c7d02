use super::error::ScreenerError;
use super::models::RawContract;
use std::future::Future;

/// Provider endpoints the screener reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    LastTrade,
    Snapshot,
    PreviousClose,
    OptionsContracts,
}

impl Endpoint {
    /// Display name used by the plan probe
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::LastTrade => "Last Trade",
            Endpoint::Snapshot => "Snapshot",
            Endpoint::PreviousClose => "Previous Close",
            Endpoint::OptionsContracts => "Options Contracts",
        }
    }

    /// Phrase used inside error messages
    pub fn context(&self) -> &'static str {
        match self {
            Endpoint::LastTrade => "fetching last trade",
            Endpoint::Snapshot => "snapshot",
            Endpoint::PreviousClose => "previous close",
            Endpoint::OptionsContracts => "options contracts",
        }
    }

    pub fn network_error(&self, ticker: &str) -> ScreenerError {
        ScreenerError::Network(format!("Network error {} ({}).", self.context(), ticker))
    }
}

/// Read-only market data needed for one screening pass.
///
/// Each price method yields a positive price or the classified failure of that
/// single endpoint; fallback between endpoints is the resolver's job.
pub trait MarketData {
    fn last_trade(&self, ticker: &str) -> impl Future<Output = Result<f64, ScreenerError>> + Send;

    fn snapshot_price(&self, ticker: &str) -> impl Future<Output = Result<f64, ScreenerError>> + Send;

    fn previous_close(&self, ticker: &str) -> impl Future<Output = Result<f64, ScreenerError>> + Send;

    /// Non-expired call contracts, one provider page
    fn call_chain(
        &self,
        ticker: &str,
    ) -> impl Future<Output = Result<Vec<RawContract>, ScreenerError>> + Send;
}
