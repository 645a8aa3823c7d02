use super::chain_fetcher::fetch_call_chain;
use super::error::ScreenerError;
use super::evaluator::evaluate;
use super::market_data::MarketData;
use super::models::{
    ChainErrorPolicy, Opportunity, PriceMode, RawContract, ScreenFilters, ScreenReport,
    ScreenRequest, SkipStats, TickerOutcome,
};
use super::normalizer::normalize;
use super::price_resolver::{PriceCache, PriceResolver};
use super::ranking::rank;
use crate::utility::timing::AggregateTimer;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const AUTH_ABORT_NOTICE: &str = "Authentication issue detected. Aborting remaining tickers.";

// -----------------------------------------------
// TICKER PIPELINE: price -> chain -> normalize -> evaluate
// -----------------------------------------------
pub struct Screener<P> {
    provider: Arc<P>,
    resolver: PriceResolver<P>,
    chain_policy: ChainErrorPolicy,
}

impl<P: MarketData> Screener<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            resolver: PriceResolver::new(Arc::clone(&provider)),
            provider,
            chain_policy: ChainErrorPolicy::default(),
        }
    }

    /// Share a price cache across runs (server mode keeps one per process)
    pub fn with_price_cache(provider: Arc<P>, cache: Arc<PriceCache>) -> Self {
        Self {
            resolver: PriceResolver::with_cache(Arc::clone(&provider), cache),
            provider,
            chain_policy: ChainErrorPolicy::default(),
        }
    }

    pub fn with_chain_policy(mut self, policy: ChainErrorPolicy) -> Self {
        self.chain_policy = policy;
        self
    }

    pub fn resolver(&self) -> &PriceResolver<P> {
        &self.resolver
    }

    pub async fn process_ticker(
        &self,
        ticker: &str,
        filters: &ScreenFilters,
        mode: PriceMode,
        today: NaiveDate,
    ) -> Result<TickerOutcome, ScreenerError> {
        let ticker = ticker.trim().to_uppercase();

        let stock_price = self.resolver.resolve_price(&ticker, mode).await?;

        let contracts = fetch_call_chain(self.provider.as_ref(), &ticker, self.chain_policy).await?;
        if contracts.is_empty() {
            return Err(ScreenerError::NoData(format!(
                "No option contracts retrieved for {}.",
                ticker
            )));
        }

        let (opportunities, skipped) = screen_contracts(&ticker, stock_price, &contracts, today, filters);
        info!(
            ticker = %ticker,
            stock_price,
            contracts = contracts.len(),
            matched = opportunities.len(),
            skipped = skipped.total(),
            "ticker screened"
        );

        Ok(TickerOutcome {
            ticker,
            stock_price,
            contracts_seen: contracts.len(),
            opportunities,
            skipped,
        })
    }

    /// Screen every requested ticker in order and rank the combined result.
    ///
    /// A failing ticker is recorded as `"TICKER: message"` and the run moves on,
    /// except that an authentication failure before anything has matched stops
    /// the run.
    pub async fn run(&self, request: &ScreenRequest, today: NaiveDate) -> ScreenReport {
        let mut report = ScreenReport::default();
        let mut timings = AggregateTimer::new("ticker processing");

        for raw in &request.tickers {
            let ticker = raw.trim().to_uppercase();
            if ticker.is_empty() {
                continue;
            }

            let started = Instant::now();
            let result = self
                .process_ticker(&ticker, &request.filters, request.price_mode, today)
                .await;
            timings.record(started.elapsed());

            match result {
                Ok(outcome) => {
                    report.skipped.merge(&outcome.skipped);
                    report.opportunities.extend(outcome.opportunities);
                }
                Err(err) => {
                    warn!(ticker = %ticker, error = %err, "ticker failed");
                    report.errors.push(format!("{}: {}", ticker, err));

                    if err.is_authentication() && report.opportunities.is_empty() {
                        report.errors.push(AUTH_ABORT_NOTICE.to_string());
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        timings.summary();
        report.opportunities = rank(report.opportunities, request.sort_key);
        report
    }
}

/// Normalize and evaluate a fetched chain against one stock price
pub fn screen_contracts(
    ticker: &str,
    stock_price: f64,
    contracts: &[RawContract],
    today: NaiveDate,
    filters: &ScreenFilters,
) -> (Vec<Opportunity>, SkipStats) {
    let mut opportunities = Vec::new();
    let mut skipped = SkipStats::default();

    for raw in contracts {
        let outcome = normalize(raw, today)
            .and_then(|candidate| evaluate(ticker, stock_price, &candidate, today, filters));
        match outcome {
            Ok(opportunity) => opportunities.push(opportunity),
            Err(reason) => skipped.record(reason),
        }
    }

    (opportunities, skipped)
}
