//! Check-marker persistence.
//!
//! The idempotency guard for each check task is one persisted value: the
//! ISO calendar date (`YYYY-MM-DD`) of the task's last completed run.
//! Markers are keyed by task so each record type's batch is gated
//! independently. Stored as pretty JSON in `markers.json` under the warden
//! config directory, durable across restarts, local to this host.

use crate::error::{Result, WardenError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Get/set of per-task last-run dates.
pub trait MarkerStore: Send + Sync {
    /// The ISO date of the task's last completed run, if any.
    fn last_run_date(&self, key: &str) -> Option<String>;

    /// Record that the task completed on `date`.
    fn record_run_date(&self, key: &str, date: &str) -> Result<()>;
}

/// File-backed marker store.
///
/// With no path, the store is memory-only; useful in tests and harmless in
/// production degraded mode (the guard then only holds for the process
/// lifetime).
pub struct CheckMarkers {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl CheckMarkers {
    /// Load markers from `markers.json` in the warden config directory.
    #[must_use]
    pub fn load_default() -> Self {
        Self::load_from(crate::warden_dirs::config_dir().join("markers.json"))
    }

    /// Load markers from a specific file.
    ///
    /// A missing file starts empty; a corrupt file is logged and replaced
    /// on the next write.
    #[must_use]
    pub fn load_from(path: PathBuf) -> Self {
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("ignoring malformed marker file {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Memory-only marker store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WardenError::Marker(format!("cannot create marker dir: {e}")))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| WardenError::Marker(format!("cannot serialize markers: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| WardenError::Marker(format!("cannot write markers: {e}")))?;
        Ok(())
    }
}

impl MarkerStore for CheckMarkers {
    fn last_run_date(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn record_run_date(&self, key: &str, date: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_owned(), date.to_owned());
        self.save(&entries)
    }
}
