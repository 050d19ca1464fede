//! Warden daemon binary.
//!
//! Loads configuration, wires the check context (HTTP record store,
//! email notifier, marker file, fixed-delay pacer), registers the two
//! built-in maintenance tasks, and runs the scheduler loop. Pass
//! `--run-once` to execute both check cycles immediately and exit
//! instead of scheduling.

use std::sync::Arc;
use tracing::{error, info, warn};
use warden::check::{CheckContext, domain_expiry, password_cleanup};
use warden::clock::SystemClock;
use warden::markers::CheckMarkers;
use warden::notify::EmailNotifier;
use warden::pacing::FixedDelayPacer;
use warden::scheduler::{
    LeaderLease, LeaderLeaseConfig, RegistrationOptions, Schedule, ScheduledTask, Scheduler,
};
use warden::store::HttpRecordStore;
use warden::{TaskResult, WardenConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let config = WardenConfig::load()?;
    if config.owner.id.trim().is_empty() {
        warn!("owner.id is not configured; the domain check will fetch an empty record set");
    }

    let store = Arc::new(HttpRecordStore::new(&config.store)?);
    let notifier = Arc::new(EmailNotifier::new(&config.notify));
    let markers = Arc::new(CheckMarkers::load_default());
    let pacer = Arc::new(FixedDelayPacer::from_millis(config.checks.dispatch_pause_ms));

    let ctx = Arc::new(CheckContext::new(
        store,
        notifier,
        markers,
        pacer,
        Arc::new(SystemClock),
        config.owner.clone(),
        &config.checks,
    ));

    if std::env::args().any(|arg| arg == "--run-once") {
        run_once(&ctx).await;
        return Ok(());
    }

    let lease = LeaderLease::new(
        uuid::Uuid::new_v4().to_string(),
        std::process::id(),
        warden::warden_dirs::leader_lease_path(),
        LeaderLeaseConfig::default(),
    );

    let executor_ctx = Arc::clone(&ctx);
    let mut scheduler = Scheduler::new()
        .with_tick_interval(config.checks.tick_interval_secs)
        .with_leader_lease(lease)
        .with_executor(Box::new(move |task| {
            let ctx = Arc::clone(&executor_ctx);
            Box::pin(async move { ctx.execute(&task.id).await })
        }));

    for task in builtin_tasks(&config) {
        scheduler.register(task);
    }

    info!("wardend starting");
    scheduler.run().await.map_err(|e| {
        error!(error = %e, "scheduler loop exited");
        anyhow::anyhow!("scheduler loop exited: {e}")
    })?;

    Ok(())
}

/// The two built-in daily maintenance tasks.
fn builtin_tasks(config: &WardenConfig) -> Vec<ScheduledTask> {
    let make = |id: &str, name: &str| {
        let mut task = ScheduledTask::new(id, name, Schedule::Interval { secs: 86_400 });
        task.registration = RegistrationOptions::daily();
        task.soft_timeout_secs = config.checks.soft_timeout_secs;
        task.retry_backoff_secs = config.checks.retry_backoff_secs;
        task
    };

    vec![
        make(domain_expiry::TASK_DOMAIN_EXPIRY, "Domain expiry check"),
        make(password_cleanup::TASK_PASSWORD_CLEANUP, "Support password cleanup"),
    ]
}

/// Execute both check cycles immediately, logging each result.
async fn run_once(ctx: &CheckContext) {
    for task_id in [
        domain_expiry::TASK_DOMAIN_EXPIRY,
        password_cleanup::TASK_PASSWORD_CLEANUP,
    ] {
        match ctx.execute(task_id).await {
            TaskResult::Success(msg) => info!("{msg}"),
            TaskResult::Error(msg) => error!("{msg}"),
        }
    }
}

/// Initialise tracing to stderr and a daily-rotating log file.
///
/// The returned guard must outlive the program so buffered file output
/// is flushed on exit.
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warden=info,wardend=info"));

    let logs_dir = warden::warden_dirs::logs_dir();
    let _ = std::fs::create_dir_all(&logs_dir);
    let file_appender = tracing_appender::rolling::daily(logs_dir, "wardend.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}
