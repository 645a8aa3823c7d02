use anyhow::Result;
use colored::Colorize;
use covered_call_screener::app_config::AppConfig;
use covered_call_screener::logging;
use covered_call_screener::screener::screener_commands::ScreenerCommands;

#[tokio::main]
async fn main() -> Result<()> {
    // ========================================
    // CONFIGURATION - from environment
    // ========================================

    let app_config = AppConfig::from_env();

    if let Err(e) = logging::init_logging() {
        eprintln!("{} Logging disabled: {:#}", "⚠".yellow(), e);
    }

    if let Err(e) = app_config.validate() {
        println!("{} {}", "✗".red(), e);
        println!();
        ScreenerCommands::print_usage();
        return Err(e);
    }

    // ========================================

    match app_config.mode.as_str() {
        "server" => ScreenerCommands::run_server(&app_config).await,
        "check-key" => ScreenerCommands::check_key(&app_config).await,
        "check-plan" => ScreenerCommands::check_plan(&app_config).await,
        "clear-saved" => ScreenerCommands::clear_saved(&app_config),
        _ => ScreenerCommands::run_screen(&app_config).await,
    }
}
