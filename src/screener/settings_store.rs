use super::config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Last-used credential and ticker block, stored as plaintext JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub tickers: String,
}

impl SavedSettings {
    /// Remembered tickers, or the default block when none were saved
    pub fn tickers_or_default(&self) -> &str {
        if self.tickers.trim().is_empty() {
            config::DEFAULT_TICKERS
        } else {
            &self.tickers
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means nothing remembered; a broken one is logged and treated the same
    pub fn load(&self) -> Option<SavedSettings> {
        if !self.path.exists() {
            return None;
        }

        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load saved config file");
                return None;
            }
        };

        match serde_json::from_str::<SavedSettings>(&text) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load saved config file");
                None
            }
        }
    }

    pub fn save(&self, settings: &SavedSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to save config file {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            key = %config::mask_key(&settings.api_key),
            "settings saved"
        );
        Ok(())
    }

    /// Returns whether a file was actually removed
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove config file {}", self.path.display()))?;
        Ok(true)
    }
}

/// Credential precedence: explicit override > environment > remembered > empty
pub fn resolve_api_key(
    explicit: Option<&str>,
    environment: Option<&str>,
    remembered: Option<&str>,
) -> String {
    [explicit, environment, remembered]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .unwrap_or_default()
        .to_string()
}
