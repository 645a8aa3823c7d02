pub mod api_server;
pub mod cache;
pub mod chain_fetcher;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod market_data;
pub mod models;
pub mod normalizer;
pub mod polygon_client;
pub mod price_resolver;
pub mod processor;
pub mod ranking;
pub mod screener_commands;
pub mod settings_store;

// Re-exports (public API)
pub use cache::TtlCache;
pub use error::ScreenerError;
pub use evaluator::{calculate_metrics, evaluate, CoveredCallMetrics};
pub use market_data::{Endpoint, MarketData};
pub use models::{
    ChainErrorPolicy, ContractCandidate, Opportunity, PriceMode, RawContract, ScreenFilters,
    ScreenReport, ScreenRequest, SkipReason, SkipStats, SortKey, TickerOutcome,
};
pub use normalizer::normalize;
pub use polygon_client::PolygonClient;
pub use price_resolver::{PriceCache, PriceResolver};
pub use processor::Screener;
pub use ranking::{format_currency, format_percent, rank, FormattedOpportunity};
pub use settings_store::{SavedSettings, SettingsStore};
