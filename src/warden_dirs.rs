//! Centralized application directory paths for warden.
//!
//! Provides a single source of truth for all filesystem paths used by the
//! daemon. Uses the [`dirs`] crate for platform-appropriate directory
//! resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/warden/` | `~/.local/share/warden/` |
//! | Config | `~/Library/Application Support/warden/` | `~/.config/warden/` |
//!
//! # Environment Overrides
//!
//! All paths can be overridden for testing or custom deployments:
//! - `WARDEN_DATA_DIR` — overrides [`data_dir`]
//! - `WARDEN_CONFIG_DIR` — overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Used for log files and the scheduler leader lease.
///
/// Resolves to `dirs::data_dir()/warden/` by default. Override with
/// the `WARDEN_DATA_DIR` environment variable.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("WARDEN_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("warden"))
        .unwrap_or_else(|| PathBuf::from("/tmp/warden-data"))
}

/// Application config directory.
///
/// Used for `config.toml`, `scheduler.json`, and `markers.json`.
///
/// Resolves to `dirs::config_dir()/warden/` by default. Override with
/// the `WARDEN_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("WARDEN_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("warden"))
        .unwrap_or_else(|| PathBuf::from("/tmp/warden-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Scheduler leader lease file (`data_dir()/scheduler.leader.lock`).
#[must_use]
pub fn leader_lease_path() -> PathBuf {
    data_dir().join("scheduler.leader.lock")
}
