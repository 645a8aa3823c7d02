use super::api_server::{self, summary_line, AppState};
use super::config;
use super::diagnostics::{key_format_warnings, Diagnostics};
use super::models::{Opportunity, ScreenReport, ScreenRequest};
use super::polygon_client::PolygonClient;
use super::price_resolver::PriceResolver;
use super::processor::Screener;
use super::ranking::{format_all, raw_cells, COLUMNS};
use super::settings_store::{resolve_api_key, SavedSettings, SettingsStore};
use crate::app_config::{parse_tickers, AppConfig};
use crate::utility::timing::Timer;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::sync::Arc;

/// Screener Command Handler - one entry point per execution mode
pub struct ScreenerCommands;

impl ScreenerCommands {
    /// Run one screening pass over the configured tickers
    pub async fn run_screen(cfg: &AppConfig) -> Result<()> {
        Self::banner("ITM Covered Call Screener");

        let store = SettingsStore::new(&cfg.settings_path);
        let saved = store.load().unwrap_or_default();
        let api_key = Self::resolve_key(cfg, &saved);
        if api_key.is_empty() {
            bail!("Please enter your Polygon.io API key (CC_API_KEY or POLYGON_API_KEY).");
        }

        let tickers_text = cfg
            .tickers_text
            .clone()
            .unwrap_or_else(|| saved.tickers_or_default().to_string());
        let request = Self::build_request(cfg, &tickers_text);
        if request.tickers.is_empty() {
            bail!("Please enter at least one ticker.");
        }

        println!("{} Key: {}", "→".cyan(), config::mask_key(&api_key).yellow());
        println!("{} Tickers: {}", "→".cyan(), request.tickers.join(", ").yellow());
        println!(
            "{} DTE {}-{}, min OI {}, min premium ${:.2}, min annualized ROI {:.2}%",
            "→".cyan(),
            request.filters.dte_min,
            request.filters.dte_max,
            request.filters.min_open_interest,
            request.filters.min_premium,
            request.filters.min_annualized_roi
        );
        println!(
            "{} Price source: {}, sorted by {}",
            "→".cyan(),
            request.price_mode,
            request.sort_key.column()
        );
        println!();

        let client = Arc::new(PolygonClient::new(&api_key)?);
        let screener = Screener::new(client).with_chain_policy(cfg.chain_policy);

        let timer = Timer::start("screening run");
        let today = chrono::Local::now().date_naive();
        let report = screener.run(&request, today).await;
        let elapsed = timer.stop();

        Self::display_report(&report, cfg.raw);
        println!("{} Time taken: {:.2}s", "⏱".yellow(), elapsed.as_secs_f64());

        if let Some(path) = &cfg.output_json {
            let json = serde_json::to_string_pretty(&report.opportunities)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Saved {} opportunities to {}",
                "✓".green(),
                report.opportunities.len(),
                path.display()
            );
        }

        if cfg.remember {
            let settings = SavedSettings { api_key, tickers: tickers_text };
            if let Err(e) = store.save(&settings) {
                println!("{} {}", "⚠".yellow(), e);
            } else {
                println!("{} Remembered API key & tickers in {}", "✓".green(), store.path().display());
            }
        }

        println!();
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Done!".green().bold());
        println!("{}", "=".repeat(60).blue());
        Ok(())
    }

    /// Run API server mode
    pub async fn run_server(cfg: &AppConfig) -> Result<()> {
        Self::banner("Covered Call Screener API Server");

        let saved = SettingsStore::new(&cfg.settings_path).load().unwrap_or_default();
        let api_key = Self::resolve_key(cfg, &saved);
        if api_key.is_empty() {
            bail!("Please enter your Polygon.io API key (CC_API_KEY or POLYGON_API_KEY).");
        }

        let tickers_text = cfg
            .tickers_text
            .clone()
            .unwrap_or_else(|| saved.tickers_or_default().to_string());
        let defaults = Self::build_request(cfg, &tickers_text);

        let client = Arc::new(PolygonClient::new(&api_key)?);
        let price_cache = PriceResolver::<PolygonClient>::default_cache();
        let screener = Screener::with_price_cache(Arc::clone(&client), price_cache)
            .with_chain_policy(cfg.chain_policy);
        let diagnostics = Diagnostics::new(client);

        let state = AppState::new(screener, defaults).with_diagnostics(diagnostics, &api_key);
        api_server::start_server(state, cfg.port).await
    }

    /// Validate the resolved API key against the provider
    pub async fn check_key(cfg: &AppConfig) -> Result<()> {
        Self::banner("API Key Test");

        let saved = SettingsStore::new(&cfg.settings_path).load().unwrap_or_default();
        let api_key = Self::resolve_key(cfg, &saved);
        if api_key.is_empty() {
            println!("{} No API key entered yet.", "✗".red());
            return Ok(());
        }

        Self::display_key_shape(&api_key);

        let diagnostics = Diagnostics::new(Arc::new(PolygonClient::new(&api_key)?));
        let check = diagnostics.check_key(&api_key).await;
        if check.valid {
            println!("{} {}", "✓".green(), check.message.green());
        } else {
            println!("{} {}", "✗".red(), check.message.red());
            println!(
                "{} 401 = invalid/missing; 403 = insufficient permissions / plan level.",
                "ℹ".blue()
            );
        }
        Ok(())
    }

    /// Probe which endpoints the key's plan can reach
    pub async fn check_plan(cfg: &AppConfig) -> Result<()> {
        Self::banner("Plan Capabilities");

        let saved = SettingsStore::new(&cfg.settings_path).load().unwrap_or_default();
        let api_key = Self::resolve_key(cfg, &saved);
        if api_key.is_empty() {
            println!("{} Enter API key first", "✗".red());
            return Ok(());
        }

        let diagnostics = Diagnostics::new(Arc::new(PolygonClient::new(&api_key)?));
        println!("{}", "Endpoint Access:".cyan().bold());
        for status in diagnostics.check_plan(&api_key).await {
            let mark = if status.available { "✓".green() } else { "✗".red() };
            println!("  {} {}: {}", mark, status.endpoint.yellow(), status.detail);
        }
        Ok(())
    }

    /// Delete the remembered credentials file
    pub fn clear_saved(cfg: &AppConfig) -> Result<()> {
        let store = SettingsStore::new(&cfg.settings_path);
        if store.clear()? {
            println!("{} Saved credentials cleared.", "✓".green());
        } else {
            println!("{} Nothing saved at {}", "ℹ".blue(), store.path().display());
        }
        Ok(())
    }

    pub fn print_usage() {
        println!("{}", "Usage:".cyan().bold());
        println!("  CC_MODE=screen       Screen tickers and print the ranked table (default)");
        println!("  CC_MODE=server       Serve the screener over HTTP on CC_PORT (3001)");
        println!("  CC_MODE=check-key    Validate the API key");
        println!("  CC_MODE=check-plan   Show which endpoints the plan can reach");
        println!("  CC_MODE=clear-saved  Delete remembered credentials");
        println!();
        println!("{}", "Screen options:".cyan().bold());
        println!("  CC_TICKERS, CC_DTE_MIN, CC_DTE_MAX, CC_MIN_OI, CC_MIN_PREMIUM,");
        println!("  CC_MIN_ANNUALIZED_ROI, CC_PRICE_SOURCE, CC_SORT, CC_RAW, CC_REMEMBER,");
        println!("  CC_OUTPUT_JSON, CC_SURFACE_CHAIN_ERRORS, CC_API_KEY / POLYGON_API_KEY");
    }

    // -----------------------------------------------
    // HELPERS
    // -----------------------------------------------

    fn banner(title: &str) {
        println!("{}", "=".repeat(60).blue());
        println!("{}", title.green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();
    }

    fn resolve_key(cfg: &AppConfig, saved: &SavedSettings) -> String {
        let env_key = config::detect_env_api_key();
        resolve_api_key(
            cfg.api_key_override.as_deref(),
            env_key.as_deref(),
            Some(saved.api_key.as_str()),
        )
    }

    fn build_request(cfg: &AppConfig, tickers_text: &str) -> ScreenRequest {
        ScreenRequest {
            tickers: parse_tickers(tickers_text),
            filters: cfg.filters,
            price_mode: cfg.price_mode,
            sort_key: cfg.sort_key,
        }
    }

    fn display_key_shape(api_key: &str) {
        println!(
            "{} Key detected: {} (length {})",
            "ℹ".blue(),
            config::mask_key(api_key),
            api_key.chars().count()
        );
        for warning in key_format_warnings(api_key) {
            println!("{} {}", "⚠".yellow(), warning);
        }
    }

    fn display_report(report: &ScreenReport, raw: bool) {
        if report.opportunities.is_empty() {
            println!("{} {}", "ℹ".blue(), summary_line(0));
        } else {
            println!("{} {}", "✓".green(), summary_line(report.opportunities.len()).green());
            println!();
            Self::display_table(&report.opportunities, raw);
        }
        println!();

        if report.skipped.total() > 0 {
            println!("{}", "Skipped contracts:".cyan());
            for (reason, count) in &report.skipped.counts {
                println!("  {} {}: {}", "-".blue(), reason, count);
            }
            println!();
        }

        if !report.errors.is_empty() {
            println!("{}", "Errors / skipped tickers:".red());
            for msg in &report.errors {
                println!("  {} {}", "✗".red(), msg);
            }
            println!();
        }
    }

    fn display_table(opportunities: &[Opportunity], raw: bool) {
        let rows: Vec<Vec<String>> = if raw {
            opportunities.iter().map(|o| raw_cells(o).to_vec()).collect()
        } else {
            format_all(opportunities)
                .iter()
                .map(|row| row.cells().iter().map(|c| c.to_string()).collect())
                .collect()
        };

        let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header: Vec<String> = COLUMNS
            .iter()
            .zip(&widths)
            .map(|(name, width)| format!("{:<width$}", name, width = *width))
            .collect();
        println!("{}", header.join("  ").cyan().bold());

        for row in rows {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    let padded = format!("{:<width$}", cell, width = *width);
                    if i == 0 { padded.yellow().to_string() } else { padded }
                })
                .collect();
            println!("{}", line.join("  "));
        }
    }
}
