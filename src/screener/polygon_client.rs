use super::config;
use super::error::ScreenerError;
use super::market_data::{Endpoint, MarketData};
use super::models::RawContract;
use anyhow::{Context, Result};
use reqwest::{header, Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

// -----------------------------------------------
// CLIENT WRAPPER WITH CREDENTIAL
// -----------------------------------------------
pub struct PolygonClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Outcome of the lightweight credential check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCheck {
    pub valid: bool,
    pub message: String,
}

/// Access level of one endpoint as seen by the plan probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStatus {
    pub endpoint: String,
    pub available: bool,
    pub detail: String,
}

impl PolygonClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(config::get_base_url(), api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into().trim().to_string(),
        })
    }

    /// Request URLs carry the key; callers strip them with `without_url` before display
    async fn send(&self, url: &str, api_key: &str, timeout: Duration) -> reqwest::Result<Response> {
        self.client
            .get(url)
            .query(&[("apiKey", api_key)])
            .timeout(timeout)
            .send()
            .await
    }

    /// GET a provider URL and classify every failure
    async fn fetch_json(
        &self,
        url: &str,
        endpoint: Endpoint,
        ticker: &str,
        timeout: Duration,
    ) -> Result<Value, ScreenerError> {
        let res = self.send(url, &self.api_key, timeout).await.map_err(|e| {
            let e = e.without_url();
            debug!(endpoint = endpoint.name(), ticker, error = %e, "transport failure");
            endpoint.network_error(ticker)
        })?;

        let status = res.status();
        debug!(endpoint = endpoint.name(), ticker, status = status.as_u16(), "provider response");

        if status.is_success() {
            let text = res.text().await.map_err(|_| endpoint.network_error(ticker))?;
            serde_json::from_str(&text).map_err(|_| {
                ScreenerError::Data(format!(
                    "Malformed response {} ({}).",
                    endpoint.context(),
                    ticker
                ))
            })
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(classify_status(status, &body, endpoint, ticker))
        }
    }

    // -----------------------------------------------
    // DIAGNOSTICS
    // -----------------------------------------------

    /// Ping previous close for a liquid ticker to see whether `api_key` works
    pub async fn validate_key(&self, api_key: &str) -> KeyCheck {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return KeyCheck { valid: false, message: "Empty API key.".to_string() };
        }

        let url = config::previous_close_url(&self.base_url, config::KEY_VALIDATION_TICKER);
        match self.send(&url, api_key, config::KEY_VALIDATION_TIMEOUT).await {
            Ok(res) => {
                let status = res.status();
                let reason = status.canonical_reason().unwrap_or("").to_string();
                if status.is_success() {
                    KeyCheck { valid: true, message: "Key valid (prev data accessible).".to_string() }
                } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    let body = res.text().await.unwrap_or_default();
                    let msg = provider_message(&body).unwrap_or(reason);
                    KeyCheck {
                        valid: false,
                        message: format!("{} {}", status.as_u16(), msg).trim().to_string(),
                    }
                } else {
                    KeyCheck {
                        valid: false,
                        message: format!("HTTP {} {}", status.as_u16(), reason).trim().to_string(),
                    }
                }
            }
            Err(e) => KeyCheck { valid: false, message: format!("Network error: {}", e.without_url()) },
        }
    }

    /// Probe each endpoint the screener uses and report what the plan allows
    pub async fn plan_capabilities(&self, api_key: &str) -> Vec<EndpointStatus> {
        let ticker = config::PLAN_PROBE_TICKER;
        let probes = [
            (Endpoint::PreviousClose, config::previous_close_url(&self.base_url, ticker)),
            (Endpoint::LastTrade, config::last_trade_url(&self.base_url, ticker)),
            (Endpoint::Snapshot, config::snapshot_url(&self.base_url, ticker)),
            (
                Endpoint::OptionsContracts,
                config::call_contracts_url(&self.base_url, ticker, config::PLAN_PROBE_CONTRACT_LIMIT),
            ),
        ];

        let mut statuses = Vec::with_capacity(probes.len());
        for (endpoint, url) in probes {
            let (available, detail) = match self.send(&url, api_key.trim(), config::PLAN_PROBE_TIMEOUT).await {
                Ok(res) => {
                    let status = res.status();
                    if status.is_success() {
                        let body: Value = res.json().await.unwrap_or(Value::Null);
                        describe_available(endpoint, &body)
                    } else if status == StatusCode::FORBIDDEN {
                        let body = res.text().await.unwrap_or_default();
                        let msg = provider_message(&body)
                            .unwrap_or_else(|| "Forbidden - plan restriction".to_string());
                        (false, msg)
                    } else if status == StatusCode::UNAUTHORIZED {
                        (false, "Unauthorized - check API key".to_string())
                    } else {
                        (false, format!("HTTP {}", status.as_u16()))
                    }
                }
                Err(e) => {
                    let text: String = e.without_url().to_string().chars().take(50).collect();
                    (false, format!("Error: {}", text))
                }
            };
            statuses.push(EndpointStatus {
                endpoint: endpoint.name().to_string(),
                available,
                detail,
            });
        }
        statuses
    }
}

impl MarketData for PolygonClient {
    async fn last_trade(&self, ticker: &str) -> Result<f64, ScreenerError> {
        let url = config::last_trade_url(&self.base_url, ticker);
        let body = self.fetch_json(&url, Endpoint::LastTrade, ticker, config::PRICE_TIMEOUT).await?;
        parse_last_trade_price(&body).ok_or_else(|| {
            ScreenerError::Data(format!("Last trade endpoint returned no price for {}.", ticker))
        })
    }

    async fn snapshot_price(&self, ticker: &str) -> Result<f64, ScreenerError> {
        let url = config::snapshot_url(&self.base_url, ticker);
        let body = self.fetch_json(&url, Endpoint::Snapshot, ticker, config::PRICE_TIMEOUT).await?;
        parse_snapshot_price(&body).ok_or_else(|| {
            ScreenerError::Data(format!("Snapshot endpoint returned no price for {}.", ticker))
        })
    }

    async fn previous_close(&self, ticker: &str) -> Result<f64, ScreenerError> {
        let url = config::previous_close_url(&self.base_url, ticker);
        let body = self.fetch_json(&url, Endpoint::PreviousClose, ticker, config::PRICE_TIMEOUT).await?;
        parse_previous_close(&body)
            .ok_or_else(|| ScreenerError::NoData(format!("Previous close not found for {}.", ticker)))
    }

    async fn call_chain(&self, ticker: &str) -> Result<Vec<RawContract>, ScreenerError> {
        let url = config::call_contracts_url(&self.base_url, ticker, config::OPTIONS_PAGE_LIMIT);
        let body = self
            .fetch_json(&url, Endpoint::OptionsContracts, ticker, config::CHAIN_TIMEOUT)
            .await?;
        Ok(parse_contracts(body))
    }
}

// -----------------------------------------------
// RESPONSE PARSING
// -----------------------------------------------

/// `last.price`, then `last.p`
pub fn parse_last_trade_price(body: &Value) -> Option<f64> {
    first_positive(body, &["/last/price", "/last/p"])
}

/// `ticker.lastTrade.price`, then `ticker.lastTrade.p`
pub fn parse_snapshot_price(body: &Value) -> Option<f64> {
    first_positive(body, &["/ticker/lastTrade/price", "/ticker/lastTrade/p"])
}

/// `results[0].c`
pub fn parse_previous_close(body: &Value) -> Option<f64> {
    first_positive(body, &["/results/0/c"])
}

/// The `results` array of a contracts page; anything else reads as empty
pub fn parse_contracts(body: Value) -> Vec<RawContract> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items.into_iter().map(RawContract::new).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn first_positive(body: &Value, pointers: &[&str]) -> Option<f64> {
    pointers
        .iter()
        .filter_map(|ptr| body.pointer(ptr))
        .filter_map(Value::as_f64)
        .find(|price| price.is_finite() && *price > 0.0)
}

/// `error` or `message` from a provider error body
fn provider_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .or_else(|| json.get("message"))
        .and_then(Value::as_str)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// Map a non-2xx response onto the screener's error kinds
pub fn classify_status(status: StatusCode, body: &str, endpoint: Endpoint, ticker: &str) -> ScreenerError {
    match status {
        StatusCode::UNAUTHORIZED => {
            let msg = provider_message(body).unwrap_or_else(|| "Unauthorized (401)".to_string());
            ScreenerError::Authentication(format!(
                "401 {} ({}): {} (Invalid / missing API key?)",
                endpoint.context(),
                ticker,
                msg
            ))
        }
        StatusCode::FORBIDDEN => {
            let msg = provider_message(body).unwrap_or_else(|| "Forbidden (403)".to_string());
            let guidance = match endpoint {
                Endpoint::LastTrade | Endpoint::Snapshot => " (Plan may not include realtime data)",
                _ => "",
            };
            ScreenerError::Authorization(format!(
                "403 {} ({}): {}{}",
                endpoint.context(),
                ticker,
                msg,
                guidance
            ))
        }
        other => ScreenerError::Http {
            status: other.as_u16(),
            message: format!("HTTP {} {} ({}).", other.as_u16(), endpoint.context(), ticker),
        },
    }
}

fn describe_available(endpoint: Endpoint, body: &Value) -> (bool, String) {
    let results = body.get("results").and_then(Value::as_array);
    match endpoint {
        Endpoint::OptionsContracts => match results {
            Some(contracts) if !contracts.is_empty() => {
                let has_quotes = contracts[0]
                    .get("last_quote")
                    .map(|q| !q.is_null() && q.as_object().is_none_or(|o| !o.is_empty()))
                    .unwrap_or(false);
                (
                    true,
                    format!(
                        "Available ({} contracts, quotes: {})",
                        contracts.len(),
                        if has_quotes { "Yes" } else { "No" }
                    ),
                )
            }
            _ => (true, "Endpoint works but no data returned".to_string()),
        },
        Endpoint::PreviousClose => match parse_previous_close(body) {
            Some(price) => (true, format!("Available (price: ${:.2})", price)),
            None => (true, "Endpoint works but no data".to_string()),
        },
        Endpoint::LastTrade | Endpoint::Snapshot => (true, "Available".to_string()),
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(config::USER_AGENT)
        .timeout(config::CHAIN_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
