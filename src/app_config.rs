use crate::screener::config;
use crate::screener::models::{ChainErrorPolicy, PriceMode, ScreenFilters, SortKey};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const MODES: [&str; 5] = ["screen", "server", "check-key", "check-plan", "clear-saved"];

/// Application configuration handler
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: String,
    pub port: u16,
    /// Raw ticker block as given; `None` falls back to remembered or default tickers
    pub tickers_text: Option<String>,
    pub filters: ScreenFilters,
    pub price_mode: PriceMode,
    pub sort_key: SortKey,
    pub api_key_override: Option<String>,
    pub remember: bool,
    pub raw: bool,
    pub chain_policy: ChainErrorPolicy,
    pub output_json: Option<PathBuf>,
    pub settings_path: PathBuf,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unparsable numbers fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let filters = ScreenFilters {
            dte_min: parse_or(get("CC_DTE_MIN"), config::DEFAULT_DTE_MIN),
            dte_max: parse_or(get("CC_DTE_MAX"), config::DEFAULT_DTE_MAX),
            min_open_interest: parse_or_u64(get("CC_MIN_OI"), config::DEFAULT_MIN_OPEN_INTEREST),
            min_premium: parse_or_f64(get("CC_MIN_PREMIUM"), config::DEFAULT_MIN_PREMIUM),
            min_annualized_roi: parse_or_f64(
                get("CC_MIN_ANNUALIZED_ROI"),
                config::DEFAULT_MIN_ANNUALIZED_ROI,
            ),
        };

        let chain_policy = if flag(get("CC_SURFACE_CHAIN_ERRORS")) {
            ChainErrorPolicy::Surface
        } else {
            ChainErrorPolicy::Collapse
        };

        Self {
            mode: get("CC_MODE").map(|m| m.to_lowercase()).unwrap_or_else(|| "screen".to_string()),
            port: get("CC_PORT").and_then(|p| p.parse().ok()).unwrap_or(3001),
            tickers_text: get("CC_TICKERS"),
            filters,
            price_mode: get("CC_PRICE_SOURCE")
                .and_then(|v| PriceMode::from_str(&v).ok())
                .unwrap_or_default(),
            sort_key: get("CC_SORT").and_then(|v| SortKey::from_str(&v).ok()).unwrap_or_default(),
            api_key_override: get("CC_API_KEY"),
            remember: flag(get("CC_REMEMBER")),
            raw: flag(get("CC_RAW")),
            chain_policy,
            output_json: get("CC_OUTPUT_JSON").map(PathBuf::from),
            settings_path: get("CC_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_SETTINGS_PATH)),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !MODES.contains(&self.mode.as_str()) {
            bail!("Unknown mode '{}'. Expected one of: {}", self.mode, MODES.join(", "));
        }
        validate_filters(&self.filters)
    }
}

pub fn validate_filters(filters: &ScreenFilters) -> Result<()> {
    if filters.dte_min < 0 {
        bail!("DTE minimum must not be negative (got {})", filters.dte_min);
    }
    if filters.dte_min > filters.dte_max {
        bail!(
            "DTE minimum {} is greater than DTE maximum {}",
            filters.dte_min,
            filters.dte_max
        );
    }
    if !filters.min_premium.is_finite() || filters.min_premium < 0.0 {
        bail!("Minimum premium must be a non-negative number (got {})", filters.min_premium);
    }
    if !filters.min_annualized_roi.is_finite() || filters.min_annualized_roi < 0.0 {
        bail!(
            "Minimum annualized ROI must be a non-negative number (got {})",
            filters.min_annualized_roi
        );
    }
    Ok(())
}

/// One ticker per line, commas and spaces also accepted; trimmed, upper-cased, blanks dropped
pub fn parse_tickers(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn parse_or(value: Option<String>, default: i64) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_or_u64(value: Option<String>, default: u64) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_or_f64(value: Option<String>, default: f64) -> f64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::to_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.mode, "screen");
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.filters, ScreenFilters::default());
        assert_eq!(cfg.price_mode, PriceMode::Auto);
        assert_eq!(cfg.sort_key, SortKey::ReturnIfAssigned);
        assert_eq!(cfg.chain_policy, ChainErrorPolicy::Collapse);
        assert!(!cfg.remember);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let cfg = config_from(&[
            ("CC_MODE", "Server"),
            ("CC_DTE_MIN", "10"),
            ("CC_DTE_MAX", "not-a-number"),
            ("CC_MIN_PREMIUM", "0.5"),
            ("CC_PRICE_SOURCE", "previous_close"),
            ("CC_SORT", "annualized_roi"),
            ("CC_REMEMBER", "yes"),
            ("CC_SURFACE_CHAIN_ERRORS", "1"),
        ]);
        assert_eq!(cfg.mode, "server");
        assert_eq!(cfg.filters.dte_min, 10);
        assert_eq!(cfg.filters.dte_max, config::DEFAULT_DTE_MAX);
        assert_eq!(cfg.filters.min_premium, 0.5);
        assert_eq!(cfg.price_mode, PriceMode::PreviousClose);
        assert_eq!(cfg.sort_key, SortKey::AnnualizedRoi);
        assert!(cfg.remember);
        assert_eq!(cfg.chain_policy, ChainErrorPolicy::Surface);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let cfg = config_from(&[("CC_DTE_MIN", "50"), ("CC_DTE_MAX", "10")]);
        assert!(cfg.validate().is_err());

        let cfg = config_from(&[("CC_MIN_PREMIUM", "-1")]);
        assert!(cfg.validate().is_err());

        let cfg = config_from(&[("CC_MIN_ANNUALIZED_ROI", "NaN")]);
        assert!(cfg.validate().is_err());

        let cfg = config_from(&[("CC_MODE", "batch")]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parse_tickers() {
        assert_eq!(parse_tickers(" ai\nmsft\n\n sofi "), vec!["AI", "MSFT", "SOFI"]);
        assert_eq!(parse_tickers("aapl, tsla,,nvda"), vec!["AAPL", "TSLA", "NVDA"]);
        assert!(parse_tickers("  \n ").is_empty());
    }
}
