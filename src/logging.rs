use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "covered-call-screener.log";

/// Log directory, `./logs` unless CC_LOG_DIR says otherwise
pub fn log_dir() -> String {
    std::env::var("CC_LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .unwrap_or_else(|| "./logs".to_string())
}

/// Initialize logging to both console and file
/// Log files are created in the log directory with daily rotation
pub fn init_logging() -> Result<()> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_NAME);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .with(
            // File output with JSON formatting
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false)
                .json(),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
