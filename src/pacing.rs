//! Dispatch pacing.
//!
//! The notification service rate-limits senders, so the dispatcher pauses
//! between consecutive actions. The policy is injected: production uses a
//! fixed delay, tests use no delay so cycles run at full speed.

use async_trait::async_trait;
use std::time::Duration;

/// Pause policy applied between consecutive dispatch actions.
#[async_trait]
pub trait DispatchPacer: Send + Sync {
    /// Wait until the next action may be issued.
    async fn pause(&self);
}

/// Fixed pause between actions.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    /// Pacer with the given inter-action delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Pacer from a delay in milliseconds.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

#[async_trait]
impl DispatchPacer for FixedDelayPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// No pause; for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl DispatchPacer for NoopPacer {
    async fn pause(&self) {}
}
