//! Domain expiry warning cycle.
//!
//! Warns the record owner once per eligible domain when its remaining time
//! hits a warning threshold. One completed cycle per calendar day: the
//! whole batch is gated by a single persisted last-run date, checked
//! before any fetch. A domain whose send fails is not retried within the
//! cycle; the next day's filter re-evaluates it like any other record.

use crate::check::{CheckContext, CycleOutcome};
use crate::check::eligibility;
use crate::clock::Clock;
use crate::error::Result;
use crate::markers::MarkerStore;
use crate::notify::{ExpiryWarning, Notifier};
use crate::pacing::DispatchPacer;
use crate::store::RecordStore;
use tracing::{debug, error, info};

/// Scheduler task id for this cycle.
pub const TASK_DOMAIN_EXPIRY: &str = "domain_expiry";

/// Run one guard→fetch→filter→dispatch→persist cycle.
///
/// Fetch or decode failure aborts before the marker is touched, so the
/// next trigger retries the whole batch. Per-domain send failures are
/// logged and tolerated; the cycle still completes and persists its
/// marker.
pub async fn run_cycle(ctx: &CheckContext) -> Result<CycleOutcome> {
    let today = ctx.clock.today_utc().to_string();
    if ctx.markers.last_run_date(TASK_DOMAIN_EXPIRY).as_deref() == Some(today.as_str()) {
        debug!("domain expiry check already ran today");
        return Ok(CycleOutcome::Skipped);
    }

    let domains = ctx.store.fetch_domains(&ctx.owner.id).await?;
    debug!(count = domains.len(), "fetched domain records");

    let eligible = eligibility::eligible_domains(&domains, ctx.clock.now_utc(), &ctx.thresholds);

    let mut dispatched = 0usize;
    let mut failed = 0usize;
    for (i, (domain, days_left)) in eligible.iter().enumerate() {
        if i > 0 {
            ctx.pacer.pause().await;
        }

        let warning = ExpiryWarning {
            to_email: ctx.owner.email.clone(),
            to_name: ctx.owner.name.clone(),
            domain_name: domain.domain.clone(),
            days_left: *days_left,
        };
        match ctx.notifier.send_expiry_warning(&warning).await {
            Ok(()) => {
                info!(domain = %domain.domain, days_left, "expiry warning sent");
                dispatched += 1;
            }
            Err(e) => {
                error!(domain = %domain.domain, error = %e, "expiry warning failed");
                failed += 1;
            }
        }
    }

    ctx.markers.record_run_date(TASK_DOMAIN_EXPIRY, &today)?;
    info!(dispatched, failed, "domain expiry check complete");
    Ok(CycleOutcome::Completed { dispatched, failed })
}
