//! Support-password cleanup cycle.
//!
//! Deletes support passwords created on an earlier calendar day. Same
//! shape as the expiry warning cycle: a per-day marker gates the batch, a
//! failed delete is logged and skipped, and the remaining records are
//! still processed. A password whose delete fails stays stale and is
//! picked up again by the next day's filter.

use crate::check::{CheckContext, CycleOutcome};
use crate::check::eligibility;
use crate::clock::Clock;
use crate::error::Result;
use crate::markers::MarkerStore;
use crate::pacing::DispatchPacer;
use crate::store::RecordStore;
use tracing::{debug, error, info};

/// Scheduler task id for this cycle.
pub const TASK_PASSWORD_CLEANUP: &str = "password_cleanup";

/// Run one guard→fetch→filter→dispatch→persist cycle.
pub async fn run_cycle(ctx: &CheckContext) -> Result<CycleOutcome> {
    let today = ctx.clock.today_utc().to_string();
    if ctx.markers.last_run_date(TASK_PASSWORD_CLEANUP).as_deref() == Some(today.as_str()) {
        debug!("password cleanup already ran today");
        return Ok(CycleOutcome::Skipped);
    }

    let passwords = ctx.store.fetch_passwords().await?;
    debug!(count = passwords.len(), "fetched password records");

    let stale = eligibility::stale_passwords(&passwords, ctx.clock.today_utc());

    let mut dispatched = 0usize;
    let mut failed = 0usize;
    for (i, password) in stale.iter().enumerate() {
        if i > 0 {
            ctx.pacer.pause().await;
        }

        match ctx.store.delete_password(&password.id).await {
            Ok(()) => {
                info!(id = %password.id, "stale password deleted");
                dispatched += 1;
            }
            Err(e) => {
                error!(id = %password.id, error = %e, "password delete failed");
                failed += 1;
            }
        }
    }

    ctx.markers.record_run_date(TASK_PASSWORD_CLEANUP, &today)?;
    info!(dispatched, failed, "password cleanup complete");
    Ok(CycleOutcome::Completed { dispatched, failed })
}
