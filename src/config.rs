use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

// =============================================================================
// Source-related constants
// =============================================================================

/// Service index of the default package source
pub const DEFAULT_SOURCE_URL: &str = "https://api.nuget.org/v3/index.json";

/// Timeout for a single HTTP request in milliseconds (100 seconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 100_000;

/// Environment variable overriding the local package directory
pub const PACKAGES_DIR_ENV: &str = "NUGET_PACKAGES";

/// Restore configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RestoreConfig {
    pub source: SourceConfig,
    /// Local package directory; see [`RestoreConfig::packages_dir`]
    pub packages_dir: Option<PathBuf>,
}

/// Remote package source configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    /// Service index URL
    pub url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RestoreConfig {
    /// Load the configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Returns the local package directory.
    /// Uses the configured directory if set, then $NUGET_PACKAGES,
    /// then ~/.nuget/packages, or ./packages if no home directory is available.
    pub fn packages_dir(&self) -> PathBuf {
        packages_dir_with_env(
            self.packages_dir.clone(),
            std::env::var(PACKAGES_DIR_ENV).ok(),
            dirs::home_dir(),
        )
    }
}

/// Returns the path to the log directory.
pub fn log_dir() -> PathBuf {
    log_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

fn packages_dir_with_env(
    configured: Option<PathBuf>,
    env_dir: Option<String>,
    home_dir: Option<PathBuf>,
) -> PathBuf {
    configured
        .or_else(|| env_dir.filter(|dir| !dir.is_empty()).map(PathBuf::from))
        .or_else(|| home_dir.map(|home| home.join(".nuget/packages")))
        .unwrap_or_else(|| PathBuf::from("./packages"))
}

fn log_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("restore-engine")
}
