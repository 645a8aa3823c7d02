use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use covered_call_screener::screener::{MarketData, PolygonClient, ScreenerError};
use serde_json::json;
use std::collections::HashMap;

// -----------------------------------------------
// MOCK PROVIDER
// -----------------------------------------------

const GOOD_KEY: &str = "test-key-0123456789abcdef";

fn failure(ticker: &str) -> Option<Response> {
    match ticker {
        "AUTH" => Some((StatusCode::UNAUTHORIZED, Json(json!({"status": "ERROR", "error": "Unknown API Key"}))).into_response()),
        "PLAN" => Some((StatusCode::FORBIDDEN, Json(json!({"status": "NOT_AUTHORIZED", "message": "You are not entitled to this data."}))).into_response()),
        "BOOM" => Some((StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()),
        "JUNK" => Some((StatusCode::OK, "<html>not json</html>").into_response()),
        _ => None,
    }
}

fn bad_key(params: &HashMap<String, String>) -> Option<Response> {
    (params.get("apiKey").map(String::as_str) != Some(GOOD_KEY))
        .then(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unknown API Key"}))).into_response())
}

async fn last_trade(Path(ticker): Path<String>, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Some(res) = bad_key(&params).or_else(|| failure(&ticker)) {
        return res;
    }
    match ticker.as_str() {
        "AAPL" => Json(json!({"status": "OK", "last": {"price": 190.5}})).into_response(),
        "ALT" => Json(json!({"status": "OK", "last": {"p": 12.25}})).into_response(),
        _ => Json(json!({"status": "OK"})).into_response(),
    }
}

async fn snapshot(Path(ticker): Path<String>, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Some(res) = bad_key(&params).or_else(|| failure(&ticker)) {
        return res;
    }
    match ticker.as_str() {
        "AAPL" => Json(json!({"ticker": {"lastTrade": {"p": 190.4}}})).into_response(),
        _ => Json(json!({"ticker": {}})).into_response(),
    }
}

async fn previous_close(Path(ticker): Path<String>, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Some(res) = bad_key(&params).or_else(|| failure(&ticker)) {
        return res;
    }
    match ticker.as_str() {
        "AAPL" | "SPY" => Json(json!({"results": [{"c": 189.98, "o": 188.0}]})).into_response(),
        _ => Json(json!({"results": []})).into_response(),
    }
}

async fn contracts(Query(params): Query<HashMap<String, String>>) -> Response {
    if let Some(res) = bad_key(&params) {
        return res;
    }
    let ticker = params.get("underlying_ticker").cloned().unwrap_or_default();
    if let Some(res) = failure(&ticker) {
        return res;
    }
    assert_eq!(params.get("contract_type").map(String::as_str), Some("call"));
    assert_eq!(params.get("expired").map(String::as_str), Some("false"));

    match ticker.as_str() {
        "AAPL" => Json(json!({
            "results": [
                {"strike_price": 185.0, "expiration_date": "2026-11-20", "open_interest": 1200, "last_quote": {"bid": 8.1}},
                {"strike_price": 195.0, "expiration_date": "2026-11-20", "open_interest": 900}
            ]
        }))
        .into_response(),
        _ => Json(json!({"results": null})).into_response(),
    }
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/v2/last/trade/{ticker}", get(last_trade))
        .route("/v2/snapshot/locale/us/markets/stocks/tickers/{ticker}", get(snapshot))
        .route("/v2/aggs/ticker/{ticker}/prev", get(previous_close))
        .route("/v3/reference/options/contracts", get(contracts));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client() -> PolygonClient {
    PolygonClient::with_base_url(spawn_mock().await, GOOD_KEY).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_price_endpoints_parse() {
        let client = client().await;
        assert_eq!(client.last_trade("AAPL").await, Ok(190.5));
        assert_eq!(client.last_trade("ALT").await, Ok(12.25));
        assert_eq!(client.snapshot_price("AAPL").await, Ok(190.4));
        assert_eq!(client.previous_close("AAPL").await, Ok(189.98));
    }

    #[tokio::test]
    async fn test_missing_price_fields() {
        let client = client().await;

        let err = client.last_trade("NONE").await.unwrap_err();
        assert_eq!(err, ScreenerError::Data("Last trade endpoint returned no price for NONE.".into()));

        let err = client.snapshot_price("NONE").await.unwrap_err();
        assert!(matches!(err, ScreenerError::Data(_)));

        let err = client.previous_close("NONE").await.unwrap_err();
        assert_eq!(err, ScreenerError::NoData("Previous close not found for NONE.".into()));
    }

    #[tokio::test]
    async fn test_status_classification() {
        let client = client().await;

        let err = client.last_trade("AUTH").await.unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(
            err.to_string(),
            "401 fetching last trade (AUTH): Unknown API Key (Invalid / missing API key?)"
        );

        let err = client.snapshot_price("PLAN").await.unwrap_err();
        assert!(matches!(err, ScreenerError::Authorization(_)));
        assert_eq!(
            err.to_string(),
            "403 snapshot (PLAN): You are not entitled to this data. (Plan may not include realtime data)"
        );

        let err = client.previous_close("PLAN").await.unwrap_err();
        assert_eq!(err.to_string(), "403 previous close (PLAN): You are not entitled to this data.");

        let err = client.previous_close("BOOM").await.unwrap_err();
        assert_eq!(
            err,
            ScreenerError::Http { status: 500, message: "HTTP 500 previous close (BOOM).".into() }
        );

        let err = client.last_trade("JUNK").await.unwrap_err();
        assert_eq!(err, ScreenerError::Data("Malformed response fetching last trade (JUNK).".into()));
    }

    #[tokio::test]
    async fn test_call_chain() {
        let client = client().await;

        let chain = client.call_chain("AAPL").await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].field(&["strike_price"]), Some(&json!(185.0)));

        assert!(client.call_chain("EMPTY").await.unwrap().is_empty());

        let err = client.call_chain("AUTH").await.unwrap_err();
        assert!(err.to_string().starts_with("401 options contracts (AUTH)"));
    }

    #[tokio::test]
    async fn test_network_error() {
        let client = PolygonClient::with_base_url("http://127.0.0.1:1", GOOD_KEY).unwrap();
        let err = client.last_trade("AAPL").await.unwrap_err();
        assert_eq!(err, ScreenerError::Network("Network error fetching last trade (AAPL).".into()));
    }

    #[tokio::test]
    async fn test_transport_errors_hide_the_key() {
        let secret = "SECRETKEY0123456789abcdef";
        let client = PolygonClient::with_base_url("http://127.0.0.1:1", secret).unwrap();

        let check = client.validate_key(secret).await;
        assert!(!check.valid);
        assert!(check.message.starts_with("Network error"));
        assert!(!check.message.contains(secret));

        for status in client.plan_capabilities(secret).await {
            assert!(!status.available);
            assert!(!status.detail.contains(secret));
        }

        let err = client.previous_close("SPY").await.unwrap_err();
        assert!(!err.to_string().contains(secret));
    }

    #[tokio::test]
    async fn test_validate_key() {
        let client = client().await;

        let check = client.validate_key(GOOD_KEY).await;
        assert!(check.valid);
        assert_eq!(check.message, "Key valid (prev data accessible).");

        let check = client.validate_key("wrong").await;
        assert!(!check.valid);
        assert_eq!(check.message, "401 Unknown API Key");

        let check = client.validate_key("   ").await;
        assert!(!check.valid);
        assert_eq!(check.message, "Empty API key.");
    }

    #[tokio::test]
    async fn test_plan_capabilities() {
        let client = client().await;

        let statuses = client.plan_capabilities(GOOD_KEY).await;
        let names: Vec<&str> = statuses.iter().map(|s| s.endpoint.as_str()).collect();
        assert_eq!(names, vec!["Previous Close", "Last Trade", "Snapshot", "Options Contracts"]);
        assert!(statuses.iter().all(|s| s.available));
        assert_eq!(statuses[0].detail, "Available (price: $189.98)");

        let statuses = client.plan_capabilities("wrong").await;
        assert!(statuses.iter().all(|s| !s.available));
        assert!(statuses.iter().all(|s| s.detail == "Unauthorized - check API key"));
    }
}
