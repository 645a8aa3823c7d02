use super::error::ScreenerError;
use super::market_data::MarketData;
use super::models::{ChainErrorPolicy, RawContract};
use tracing::{debug, warn};

/// Fetch one page of non-expired calls for `ticker`.
///
/// Under `ChainErrorPolicy::Collapse` every fetch failure comes back as an empty
/// list, so callers only ever see "no data". `Surface` hands the error through.
pub async fn fetch_call_chain<P: MarketData>(
    provider: &P,
    ticker: &str,
    policy: ChainErrorPolicy,
) -> Result<Vec<RawContract>, ScreenerError> {
    match provider.call_chain(ticker).await {
        Ok(contracts) => {
            debug!(ticker, count = contracts.len(), "call chain fetched");
            Ok(contracts)
        }
        Err(err) => match policy {
            ChainErrorPolicy::Collapse => {
                warn!(ticker, error = %err, "call chain fetch failed, treating as empty");
                Ok(Vec::new())
            }
            ChainErrorPolicy::Surface => Err(err),
        },
    }
}
