use std::time::Duration;

// -----------------------------------------------
// POLYGON API ENDPOINTS
// -----------------------------------------------
pub const POLYGON_BASE_URL: &str = "https://api.polygon.io";

/// Page size imposed by the options reference endpoint
pub const OPTIONS_PAGE_LIMIT: usize = 1000;

pub fn last_trade_url(base: &str, ticker: &str) -> String {
    format!("{}/v2/last/trade/{}", base, urlencoding::encode(ticker))
}

pub fn snapshot_url(base: &str, ticker: &str) -> String {
    format!(
        "{}/v2/snapshot/locale/us/markets/stocks/tickers/{}",
        base,
        urlencoding::encode(ticker)
    )
}

pub fn previous_close_url(base: &str, ticker: &str) -> String {
    format!("{}/v2/aggs/ticker/{}/prev", base, urlencoding::encode(ticker))
}

pub fn call_contracts_url(base: &str, ticker: &str, limit: usize) -> String {
    format!(
        "{}/v3/reference/options/contracts?underlying_ticker={}&contract_type=call&expired=false&limit={}",
        base,
        urlencoding::encode(ticker),
        limit
    )
}

// -----------------------------------------------
// DIAGNOSTICS
// -----------------------------------------------
pub const KEY_VALIDATION_TICKER: &str = "SPY";
pub const PLAN_PROBE_TICKER: &str = "AAPL";
pub const PLAN_PROBE_CONTRACT_LIMIT: usize = 10;

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "ITM-Covered-Call-Screener/1.0";

pub const PRICE_TIMEOUT: Duration = Duration::from_secs(10);
pub const CHAIN_TIMEOUT: Duration = Duration::from_secs(20);
pub const KEY_VALIDATION_TIMEOUT: Duration = Duration::from_secs(8);
pub const PLAN_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

// -----------------------------------------------
// CACHE TTLS
// -----------------------------------------------
pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(300);
pub const KEY_VALIDATION_TTL: Duration = Duration::from_secs(120);
pub const PLAN_PROBE_TTL: Duration = Duration::from_secs(300);

// -----------------------------------------------
// SCREEN DEFAULTS
// -----------------------------------------------
pub const DEFAULT_DTE_MIN: i64 = 25;
pub const DEFAULT_DTE_MAX: i64 = 45;
pub const DEFAULT_MIN_OPEN_INTEREST: u64 = 100;
pub const DEFAULT_MIN_PREMIUM: f64 = 0.10;
pub const DEFAULT_MIN_ANNUALIZED_ROI: f64 = 0.0;
pub const DEFAULT_TICKERS: &str = "AI\nMSFT\nSOFI";

// -----------------------------------------------
// SETTINGS FILE
// -----------------------------------------------
pub const DEFAULT_SETTINGS_PATH: &str = ".itm_cc_config.json";

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Base URL for the provider, overridable for local mocks
pub fn get_base_url() -> String {
    std::env::var("POLYGON_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| POLYGON_BASE_URL.to_string())
}

/// API key exported in the environment, if any
pub fn detect_env_api_key() -> Option<String> {
    std::env::var("POLYGON_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Mask a credential for logs: first and last four characters only
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_encode_ticker() {
        assert_eq!(
            last_trade_url("http://x", "BRK.B"),
            "http://x/v2/last/trade/BRK.B"
        );
        assert_eq!(
            previous_close_url("http://x", "A B"),
            "http://x/v2/aggs/ticker/A%20B/prev"
        );
        assert!(call_contracts_url("http://x", "AAPL", 1000)
            .ends_with("underlying_ticker=AAPL&contract_type=call&expired=false&limit=1000"));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdefghijkl"), "abcd***ijkl");
        assert_eq!(mask_key("short"), "***");
    }
}
