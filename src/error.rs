//! Error types for the warden maintenance daemon.

/// Top-level error type for the expiry-watcher system.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Record store fetch/delete error.
    #[error("store error: {0}")]
    Store(String),

    /// Notification channel error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Check-marker persistence error.
    #[error("marker error: {0}")]
    Marker(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Scheduler error (task registration, state persistence, lease).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, WardenError>;
