use super::cache::TtlCache;
use super::config;
use super::error::ScreenerError;
use super::market_data::{Endpoint, MarketData};
use super::models::PriceMode;
use std::sync::Arc;
use tracing::{debug, info};

pub type PriceCache = TtlCache<(String, PriceMode), f64>;

/// Resolves a reference stock price through the provider's fallback chain
pub struct PriceResolver<P> {
    provider: Arc<P>,
    cache: Option<Arc<PriceCache>>,
}

impl<P: MarketData> PriceResolver<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider, cache: None }
    }

    /// Memoize successful lookups per (ticker, mode) in `cache`
    pub fn with_cache(provider: Arc<P>, cache: Arc<PriceCache>) -> Self {
        Self { provider, cache: Some(cache) }
    }

    /// Fresh cache with the default price TTL
    pub fn default_cache() -> Arc<PriceCache> {
        Arc::new(TtlCache::new(config::PRICE_CACHE_TTL))
    }

    pub async fn resolve_price(&self, ticker: &str, mode: PriceMode) -> Result<f64, ScreenerError> {
        let ticker = ticker.trim().to_uppercase();
        let Some(cache) = &self.cache else {
            return self.resolve_uncached(&ticker, mode).await;
        };

        let key = (ticker.clone(), mode);
        if let Some(price) = cache.get(&key).await {
            debug!(ticker = %ticker, %mode, price, "price cache hit");
            return Ok(price);
        }

        let price = self.resolve_uncached(&ticker, mode).await?;
        cache.insert(key, price).await;
        Ok(price)
    }

    async fn resolve_uncached(&self, ticker: &str, mode: PriceMode) -> Result<f64, ScreenerError> {
        let stages: &[Endpoint] = match mode {
            PriceMode::Auto => &[Endpoint::LastTrade, Endpoint::Snapshot, Endpoint::PreviousClose],
            PriceMode::PreviousClose => &[Endpoint::PreviousClose],
        };

        let mut last_err: Option<ScreenerError> = None;
        for endpoint in stages {
            let attempt = match endpoint {
                Endpoint::LastTrade => self.provider.last_trade(ticker).await,
                Endpoint::Snapshot => self.provider.snapshot_price(ticker).await,
                Endpoint::PreviousClose => self.provider.previous_close(ticker).await,
                Endpoint::OptionsContracts => continue,
            };

            match attempt {
                Ok(price) if price.is_finite() && price > 0.0 => {
                    info!(ticker, endpoint = endpoint.name(), price, "price resolved");
                    return Ok(price);
                }
                Ok(price) => {
                    let err = ScreenerError::Data(format!(
                        "{} returned non-positive price {} for {}.",
                        endpoint.name(),
                        price,
                        ticker
                    ));
                    last_err = Some(err);
                }
                Err(err) => {
                    debug!(ticker, endpoint = endpoint.name(), error = %err, "price stage failed, falling through");
                    last_err = Some(err);
                }
            }
        }

        // The final stage's own error is what the caller sees
        Err(last_err.unwrap_or_else(|| {
            ScreenerError::Data(format!("Could not get valid last trade price for {}.", ticker))
        }))
    }
}
