//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/slotbook/config.toml` by default. Command-line flags take
//! precedence over file values.
//!
//! ```toml
//! debug = false
//!
//! [api]
//! base_url = "https://book.example.com"
//! timeout_secs = 15
//!
//! [booking]
//! timezone = "Europe/Paris"
//! prefetch_workers = 6
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slotbook_api::HttpBackendConfig;
use slotbook_session::{DEFAULT_PREFETCH_WORKERS, FlowConfig};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

/// Configuration for the slotbook client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Backend connection settings.
    pub api: ApiSettings,

    /// Booking defaults.
    pub booking: BookingSettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the booking backend.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 15,
        }
    }
}

/// Booking defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    /// Timezone used when none is given on the command line.
    pub timezone: String,

    /// Concurrent day lookups when checking a month.
    pub prefetch_workers: usize,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            prefetch_workers: DEFAULT_PREFETCH_WORKERS,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content).map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slotbook")
    }

    /// Applies command-line overrides.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if cli.debug {
            self.debug = true;
        }
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = Some(base_url.clone());
        }
        if let Some(timeout) = cli.timeout {
            self.api.timeout_secs = timeout;
        }
        self
    }

    /// Builds the HTTP backend configuration.
    pub fn backend_config(&self) -> ClientResult<HttpBackendConfig> {
        let base_url = self.api.base_url.as_deref().ok_or_else(|| {
            ClientError::Config(
                "no backend configured: set api.base_url or pass --base-url".to_string(),
            )
        })?;
        Ok(HttpBackendConfig::new(base_url)?.with_timeout(Duration::from_secs(self.api.timeout_secs.max(1))))
    }

    /// Builds the booking flow configuration.
    pub fn flow_config(&self, timezone: Option<&str>) -> FlowConfig {
        FlowConfig::default()
            .with_prefetch_workers(self.booking.prefetch_workers)
            .with_timezone(timezone.unwrap_or(&self.booking.timezone))
    }
}
