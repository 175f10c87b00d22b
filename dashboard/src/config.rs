//! Dashboard configuration loaded via OrthoConfig.
//!
//! Values come from `DASHBOARD_*` environment variables, configuration files
//! and command-line flags, in OrthoConfig's usual precedence.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

/// Backend base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
/// Fixed per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_STORAGE_DIR: &str = ".dashboard-session";

/// Errors raised when configured values cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The API URL does not parse or cannot be a base URL.
    #[error("invalid API URL '{value}': {message}")]
    InvalidApiUrl {
        /// Configured value.
        value: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Configuration for the dashboard client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DASHBOARD")]
pub struct DashboardSettings {
    /// Backend API base URL.
    pub api_url: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Directory holding the persisted session.
    pub storage_dir: Option<PathBuf>,
}

impl DashboardSettings {
    /// The API base URL with a trailing slash, so relative joins keep the
    /// version prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidApiUrl`] when the value is not an
    /// absolute HTTP(S) URL.
    pub fn api_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL).trim();
        let invalid = |message: String| SettingsError::InvalidApiUrl {
            value: raw.to_owned(),
            message,
        };
        let mut url = Url::parse(raw).map_err(|error| invalid(error.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Per-request timeout, falling back to the default; zero is treated as
    /// unset.
    pub fn request_timeout(&self) -> Duration {
        let millis = self
            .request_timeout_ms
            .filter(|millis| *millis > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    /// Session storage directory, falling back to the default.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR))
    }
}
