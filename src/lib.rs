pub mod app_config;
pub mod logging;
pub mod screener;
pub mod utility;

// Re-exports for convenience
pub use app_config::AppConfig;
pub use screener::{MarketData, Opportunity, PolygonClient, ScreenReport, Screener, ScreenerError};
