use super::diagnostics::Diagnostics;
use super::market_data::MarketData;
use super::models::{Opportunity, PriceMode, ScreenRequest, SkipStats, SortKey};
use super::polygon_client::{EndpointStatus, KeyCheck};
use super::processor::Screener;
use super::ranking::{format_all, FormattedOpportunity};
use crate::app_config::{parse_tickers, validate_filters};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

/// Every field is optional; absent ones take the server's configured request
#[derive(Debug, Default, Deserialize)]
pub struct ScreenQuery {
    pub tickers: Option<String>,
    pub dte_min: Option<i64>,
    pub dte_max: Option<i64>,
    pub min_oi: Option<u64>,
    pub min_premium: Option<f64>,
    pub min_annualized_roi: Option<f64>,
    pub price_source: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub ticker: String,
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        })
    }

    fn err(error: impl Into<String>, start_time: Instant) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(error.into()),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ScreenResponse {
    pub summary: String,
    pub opportunities: Vec<Opportunity>,
    pub formatted: Vec<FormattedOpportunity>,
    pub errors: Vec<String>,
    pub aborted: bool,
    pub skipped: SkipStats,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub ticker: String,
    pub mode: PriceMode,
    pub price: f64,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

pub struct AppState<P> {
    screener: Arc<Screener<P>>,
    defaults: Arc<ScreenRequest>,
    diagnostics: Option<Arc<Diagnostics>>,
    api_key: Arc<str>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            screener: Arc::clone(&self.screener),
            defaults: Arc::clone(&self.defaults),
            diagnostics: self.diagnostics.clone(),
            api_key: Arc::clone(&self.api_key),
        }
    }
}

impl<P: MarketData> AppState<P> {
    pub fn new(screener: Screener<P>, defaults: ScreenRequest) -> Self {
        Self {
            screener: Arc::new(screener),
            defaults: Arc::new(defaults),
            diagnostics: None,
            api_key: Arc::from(""),
        }
    }

    /// Enable /api/key-check and /api/plan for `api_key`
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics, api_key: &str) -> Self {
        self.diagnostics = Some(Arc::new(diagnostics));
        self.api_key = Arc::from(api_key.trim());
        self
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /api/screen?tickers=AAPL,MSFT&dte_min=25&dte_max=45&sort=annualized_roi
async fn get_screen<P>(
    State(state): State<AppState<P>>,
    Query(query): Query<ScreenQuery>,
) -> Json<ApiResponse<ScreenResponse>>
where
    P: MarketData + Send + Sync + 'static,
{
    let start_time = Instant::now();

    let request = match build_request(&state.defaults, query) {
        Ok(request) => request,
        Err(e) => return ApiResponse::err(e, start_time),
    };

    let today = chrono::Local::now().date_naive();
    let report = state.screener.run(&request, today).await;
    info!(
        tickers = request.tickers.len(),
        matched = report.opportunities.len(),
        errors = report.errors.len(),
        "screen request served"
    );

    ApiResponse::ok(
        ScreenResponse {
            summary: summary_line(report.opportunities.len()),
            formatted: format_all(&report.opportunities),
            opportunities: report.opportunities,
            errors: report.errors,
            aborted: report.aborted,
            skipped: report.skipped,
        },
        start_time,
    )
}

/// GET /api/price?ticker=AAPL&mode=auto
async fn get_price<P>(
    State(state): State<AppState<P>>,
    Query(query): Query<PriceQuery>,
) -> Json<ApiResponse<PriceResponse>>
where
    P: MarketData + Send + Sync + 'static,
{
    let start_time = Instant::now();

    let mode = match query.mode.as_deref().map(PriceMode::from_str).transpose() {
        Ok(mode) => mode.unwrap_or(state.defaults.price_mode),
        Err(e) => return ApiResponse::err(e, start_time),
    };

    let ticker = query.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return ApiResponse::err("Ticker is required.", start_time);
    }

    match state.screener.resolver().resolve_price(&ticker, mode).await {
        Ok(price) => ApiResponse::ok(PriceResponse { ticker, mode, price }, start_time),
        Err(e) => ApiResponse::err(format!("{}: {}", ticker, e), start_time),
    }
}

/// GET /api/key-check
async fn get_key_check<P>(State(state): State<AppState<P>>) -> Json<ApiResponse<KeyCheck>>
where
    P: MarketData + Send + Sync + 'static,
{
    let start_time = Instant::now();
    match &state.diagnostics {
        Some(diagnostics) => ApiResponse::ok(diagnostics.check_key(&state.api_key).await, start_time),
        None => ApiResponse::err("Diagnostics are not available for this provider.", start_time),
    }
}

/// GET /api/plan
async fn get_plan<P>(State(state): State<AppState<P>>) -> Json<ApiResponse<Vec<EndpointStatus>>>
where
    P: MarketData + Send + Sync + 'static,
{
    let start_time = Instant::now();
    match &state.diagnostics {
        Some(diagnostics) => ApiResponse::ok(diagnostics.check_plan(&state.api_key).await, start_time),
        None => ApiResponse::err("Diagnostics are not available for this provider.", start_time),
    }
}

// -----------------------------------------------
// HELPERS
// -----------------------------------------------

fn build_request(defaults: &ScreenRequest, query: ScreenQuery) -> Result<ScreenRequest, String> {
    let mut request = defaults.clone();

    if let Some(text) = query.tickers {
        request.tickers = parse_tickers(&text);
    }
    if let Some(v) = query.dte_min {
        request.filters.dte_min = v;
    }
    if let Some(v) = query.dte_max {
        request.filters.dte_max = v;
    }
    if let Some(v) = query.min_oi {
        request.filters.min_open_interest = v;
    }
    if let Some(v) = query.min_premium {
        request.filters.min_premium = v;
    }
    if let Some(v) = query.min_annualized_roi {
        request.filters.min_annualized_roi = v;
    }
    if let Some(v) = query.price_source {
        request.price_mode = PriceMode::from_str(&v)?;
    }
    if let Some(v) = query.sort {
        request.sort_key = SortKey::from_str(&v)?;
    }

    if request.tickers.is_empty() {
        return Err("Please enter at least one ticker.".to_string());
    }
    validate_filters(&request.filters).map_err(|e| e.to_string())?;
    Ok(request)
}

pub fn summary_line(found: usize) -> String {
    if found == 0 {
        "No opportunities found matching your criteria.".to_string()
    } else {
        format!("Found {} opportunities after filters.", found)
    }
}

// -----------------------------------------------
// ROUTER & SERVER
// -----------------------------------------------

pub fn router<P>(state: AppState<P>) -> Router
where
    P: MarketData + Send + Sync + 'static,
{
    Router::new()
        .route("/api/screen", get(get_screen::<P>))
        .route("/api/price", get(get_price::<P>))
        .route("/api/key-check", get(get_key_check::<P>))
        .route("/api/plan", get(get_plan::<P>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server<P>(state: AppState<P>, port: u16) -> Result<()>
where
    P: MarketData + Send + Sync + 'static,
{
    let app = router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 Covered Call Screener API running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /api/screen?tickers=AAPL,MSFT&dte_min=25&dte_max=45&sort=annualized_roi");
    println!("   GET  /api/price?ticker=AAPL&mode=auto");
    println!("   GET  /api/key-check");
    println!("   GET  /api/plan");
    println!();

    info!(%addr, "api server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
