//! Periodic maintenance checks over date-bearing records.
//!
//! Two built-in checks run on the scheduler: the domain expiry warning
//! (notify the owner when a domain is exactly 30 or 1 days from expiry)
//! and the support-password cleanup (delete passwords older than one
//! calendar day). Both share the same cycle shape: idempotency guard,
//! fetch, pure eligibility filter, sequential paced dispatch, marker
//! persist.

pub mod domain_expiry;
pub mod eligibility;
pub mod password_cleanup;

use crate::clock::Clock;
use crate::config::{CheckConfig, OwnerConfig};
use crate::markers::MarkerStore;
use crate::notify::Notifier;
use crate::pacing::DispatchPacer;
use crate::scheduler::tasks::TaskResult;
use crate::store::RecordStore;
use std::sync::Arc;

/// Result of one check cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The idempotency guard found today's marker; nothing was done.
    Skipped,
    /// The cycle ran its dispatch phase.
    Completed {
        /// Actions that succeeded.
        dispatched: usize,
        /// Actions that failed and were skipped for this cycle.
        failed: usize,
    },
}

/// Collaborators and policy shared by the check cycles.
pub struct CheckContext {
    /// Record store the cycles fetch from and delete against.
    pub store: Arc<dyn RecordStore>,
    /// Channel expiry warnings go out on.
    pub notifier: Arc<dyn Notifier>,
    /// Per-task last-run-date markers.
    pub markers: Arc<dyn MarkerStore>,
    /// Pause policy between dispatch actions.
    pub pacer: Arc<dyn DispatchPacer>,
    /// Time source for all date decisions.
    pub clock: Arc<dyn Clock>,
    /// Record owner the checks run for.
    pub owner: OwnerConfig,
    /// Day counts that trigger a domain expiry warning.
    pub thresholds: Vec<i64>,
}

impl CheckContext {
    /// Wire a context from configuration and concrete collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        markers: Arc<dyn MarkerStore>,
        pacer: Arc<dyn DispatchPacer>,
        clock: Arc<dyn Clock>,
        owner: OwnerConfig,
        checks: &CheckConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            markers,
            pacer,
            clock,
            owner,
            thresholds: checks.warning_thresholds.clone(),
        }
    }

    /// Execute a maintenance task by scheduler task id.
    ///
    /// Returns [`TaskResult::Error`] for unknown task ids.
    pub async fn execute(&self, task_id: &str) -> TaskResult {
        match task_id {
            domain_expiry::TASK_DOMAIN_EXPIRY => {
                cycle_result("domain expiry check", domain_expiry::run_cycle(self).await)
            }
            password_cleanup::TASK_PASSWORD_CLEANUP => cycle_result(
                "password cleanup",
                password_cleanup::run_cycle(self).await,
            ),
            _ => TaskResult::Error(format!("unknown maintenance task: {task_id}")),
        }
    }
}

fn cycle_result(label: &str, outcome: crate::error::Result<CycleOutcome>) -> TaskResult {
    match outcome {
        Ok(CycleOutcome::Skipped) => TaskResult::Success(format!("{label}: already ran today")),
        Ok(CycleOutcome::Completed { dispatched, failed }) if failed == 0 => {
            TaskResult::Success(format!("{label}: {dispatched} actions dispatched"))
        }
        Ok(CycleOutcome::Completed { dispatched, failed }) => TaskResult::Success(format!(
            "{label}: {dispatched} actions dispatched, {failed} failed"
        )),
        Err(e) => TaskResult::Error(format!("{label} failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn cycle_result_maps_outcomes_to_summaries() {
        let skipped = cycle_result("domain expiry check", Ok(CycleOutcome::Skipped));
        assert!(matches!(
            skipped,
            TaskResult::Success(ref msg) if msg.contains("already ran today")
        ));

        let clean = cycle_result(
            "password cleanup",
            Ok(CycleOutcome::Completed {
                dispatched: 3,
                failed: 0,
            }),
        );
        assert!(matches!(
            clean,
            TaskResult::Success(ref msg) if msg == "password cleanup: 3 actions dispatched"
        ));

        let partial = cycle_result(
            "password cleanup",
            Ok(CycleOutcome::Completed {
                dispatched: 2,
                failed: 1,
            }),
        );
        assert!(matches!(
            partial,
            TaskResult::Success(ref msg) if msg.contains("1 failed")
        ));

        let errored = cycle_result(
            "domain expiry check",
            Err(crate::error::WardenError::Store("down".to_owned())),
        );
        assert!(matches!(errored, TaskResult::Error(_)));
    }
}
