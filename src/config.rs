//! Configuration types for the warden daemon.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the expiry watcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Record store (REST API) settings.
    pub store: StoreConfig,
    /// Notification channel settings.
    pub notify: NotifyConfig,
    /// Check-cycle policy settings.
    pub checks: CheckConfig,
    /// Record owner on whose behalf the checks run.
    pub owner: OwnerConfig,
}

/// Record store client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the record store REST API.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_owned(),
            timeout_secs: 10,
        }
    }
}

/// Notification (template email) service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Base URL of the template-send service.
    pub base_url: String,
    /// Service account identifier.
    pub service_id: String,
    /// Template identifier for the expiry warning.
    pub template_id: String,
    /// Public API key sent with each request.
    pub public_key: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.emailjs.com".to_owned(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
        }
    }
}

/// Policy knobs for the check cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Day counts at which a domain expiry warning is sent.
    ///
    /// Exact-match: a domain is warned about only on the day its remaining
    /// time equals one of these values, never in between.
    pub warning_thresholds: Vec<i64>,
    /// Pause between consecutive dispatch actions, in milliseconds.
    pub dispatch_pause_ms: u64,
    /// Soft timeout for one task run, in seconds.
    pub soft_timeout_secs: u64,
    /// Scheduler tick interval in seconds.
    pub tick_interval_secs: u64,
    /// Delay before retrying a failed task run, in seconds.
    pub retry_backoff_secs: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            warning_thresholds: vec![30, 1],
            dispatch_pause_ms: 1000,
            soft_timeout_secs: 300,
            tick_interval_secs: 60,
            retry_backoff_secs: 1800,
        }
    }
}

/// The user whose records are checked and who receives warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerConfig {
    /// User id in the record store.
    pub id: String,
    /// Display name used in notification templates.
    pub name: String,
    /// Email address warnings are sent to.
    pub email: String,
}

impl WardenConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::WardenError::Config(e.to_string()))
    }

    /// Load `config.toml` from the warden config directory.
    ///
    /// A missing file yields the default configuration; a present but
    /// unparsable file is an error.
    pub fn load() -> crate::error::Result<Self> {
        let path = crate::warden_dirs::config_dir().join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }
}
