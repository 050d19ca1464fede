//! Scheduler background loop.
//!
//! Spawns a tokio task that periodically checks for due tasks and
//! executes them. Task definitions and run history are persisted to
//! `scheduler.json` in the warden config directory, so registrations and
//! last-run times survive restarts. Persistence failures are logged and
//! otherwise ignored: the scheduler then degrades to in-memory state and
//! no error ever reaches a user.

use crate::scheduler::authority::{LeaderLease, LeadershipDecision};
use crate::scheduler::tasks::{
    self, ScheduledTask, TaskResult, TaskRunOutcome, TaskRunRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default interval between scheduler ticks (seconds).
const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Number of run-history entries to keep.
const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Callback type for executing a task.
///
/// Takes a snapshot of the scheduled task and returns its result.
pub type TaskExecutor =
    Box<dyn Fn(ScheduledTask) -> Pin<Box<dyn Future<Output = TaskResult> + Send>> + Send + Sync>;

/// Persisted scheduler state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SchedulerState {
    /// Schema version.
    #[serde(default = "default_state_version")]
    version: u8,
    /// Persisted task definitions and runtime state.
    #[serde(default)]
    tasks: Vec<ScheduledTask>,
    /// Persisted run history.
    #[serde(default)]
    history: Vec<TaskRunRecord>,
}

fn default_state_version() -> u8 {
    1
}

/// Background scheduler that runs periodic tasks.
pub struct Scheduler {
    /// Registered tasks.
    tasks: Vec<ScheduledTask>,
    /// Task ids explicitly unregistered this session; never resurrected
    /// from persisted state.
    unregistered: HashSet<String>,
    /// Recent run history.
    history: Vec<TaskRunRecord>,
    /// Path to persisted scheduler state.
    state_path: Option<PathBuf>,
    /// Task executor callback.
    executor: Option<TaskExecutor>,
    /// Max history entries kept in memory and persisted to disk.
    max_history_entries: usize,
    /// Leader lease acquired before each tick.
    leader_lease: Option<LeaderLease>,
    /// Seconds between ticks.
    tick_interval_secs: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler persisting to the default state path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            unregistered: HashSet::new(),
            history: Vec::new(),
            state_path: Some(Self::default_state_path()),
            executor: None,
            max_history_entries: DEFAULT_HISTORY_LIMIT,
            leader_lease: None,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
        }
    }

    /// Default path for the scheduler state file.
    #[must_use]
    pub fn default_state_path() -> PathBuf {
        crate::warden_dirs::config_dir().join("scheduler.json")
    }

    /// Override (or disable, with `None`) the state file path.
    #[must_use]
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.state_path = path;
        self
    }

    /// Set the executor callback for running tasks.
    #[must_use]
    pub fn with_executor(mut self, executor: TaskExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Enable single-leader scheduling via a lease controller.
    #[must_use]
    pub fn with_leader_lease(mut self, lease: LeaderLease) -> Self {
        self.leader_lease = Some(lease);
        self
    }

    /// Override the in-memory and persisted run-history limit.
    #[must_use]
    pub fn with_history_limit(mut self, max_entries: usize) -> Self {
        self.max_history_entries = max_entries.max(1);
        self
    }

    /// Override the tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs.max(1);
        self
    }

    /// Register a task unless a task with the same id already exists.
    ///
    /// Returns `true` when the task was newly registered. Registering an
    /// already-registered id is a no-op.
    pub fn register(&mut self, task: ScheduledTask) -> bool {
        if self.is_registered(&task.id) {
            debug!("task '{}' already registered", task.id);
            return false;
        }
        info!("registered task '{}' ({})", task.id, task.schedule);
        self.unregistered.remove(&task.id);
        self.tasks.push(task);
        true
    }

    /// Whether a task with this id is registered.
    #[must_use]
    pub fn is_registered(&self, task_id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == task_id)
    }

    /// Remove a task by id. Returns `true` when found.
    ///
    /// The id is remembered so the task is not resurrected from persisted
    /// state at startup.
    pub fn unregister(&mut self, task_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        let removed = self.tasks.len() != before;
        self.unregistered.insert(task_id.to_owned());
        if removed {
            info!("unregistered task '{task_id}'");
        }
        removed
    }

    /// Returns registered tasks.
    #[must_use]
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Returns scheduler run history.
    #[must_use]
    pub fn history(&self) -> &[TaskRunRecord] {
        &self.history
    }

    /// Enables or disables a task by id. Returns `true` when found.
    pub fn set_task_enabled(&mut self, task_id: &str, enabled: bool) -> bool {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.enabled = enabled;
            return true;
        }
        false
    }

    /// Marks a task due now. Returns `true` when found.
    pub fn mark_task_due_now(&mut self, task_id: &str) -> bool {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.mark_due_now();
            return true;
        }
        false
    }

    /// Load persisted state from disk and merge with registered tasks.
    ///
    /// Persisted runtime state (last run, failure streak) wins over the
    /// freshly registered definition with the same id; persisted tasks
    /// that were explicitly unregistered are dropped.
    pub fn load_state(&mut self) {
        let state = match load_state_from_path(self.state_path.as_deref()) {
            Ok(state) => state,
            Err(e) => {
                warn!("cannot load scheduler state: {e}");
                return;
            }
        };

        for task in state.tasks {
            if self.unregistered.contains(&task.id) {
                continue;
            }
            if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                *existing = task;
            } else {
                self.tasks.push(task);
            }
        }

        self.history = state.history;
        self.trim_history();

        if let Some(path) = &self.state_path {
            debug!("loaded scheduler state from {}", path.display());
        }
    }

    /// Persist task state and run history. Failure is logged, not raised.
    fn save_state(&self) {
        let state = SchedulerState {
            version: default_state_version(),
            tasks: self.tasks.clone(),
            history: self.history.clone(),
        };

        if let Err(e) = save_state_to_path(self.state_path.as_deref(), &state) {
            error!("cannot persist scheduler state: {e}");
        }
    }

    /// Start the scheduler background loop.
    pub fn run(mut self) -> tokio::task::JoinHandle<()> {
        self.load_state();
        self.prime_deferred_tasks();

        tokio::spawn(async move {
            info!("scheduler started with {} tasks", self.tasks.len());
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.tick_interval_secs));

            loop {
                interval.tick().await;
                if !self.should_execute_tick() {
                    continue;
                }
                self.tick().await;
            }
        })
    }

    /// Start the interval clock for tasks that must not run at boot.
    ///
    /// A never-run interval task with `start_on_boot = false` has nothing
    /// to count its first interval from; anchor it to process start.
    fn prime_deferred_tasks(&mut self) {
        let now = tasks::now_epoch_secs();
        for task in &mut self.tasks {
            if task.last_run.is_none() && !task.registration.start_on_boot {
                task.last_run = Some(now);
            }
        }
    }

    fn should_execute_tick(&self) -> bool {
        let Some(lease) = self.leader_lease.as_ref() else {
            return true;
        };

        match lease.try_acquire_or_renew() {
            Ok(LeadershipDecision::Leader { takeover }) => {
                if takeover {
                    info!("scheduler leadership acquired via takeover");
                }
                true
            }
            Ok(LeadershipDecision::Follower {
                leader_instance_id,
                lease_expires_at,
            }) => {
                debug!(
                    "scheduler tick skipped; leader is '{}' until {}",
                    leader_instance_id, lease_expires_at
                );
                false
            }
            Err(e) => {
                warn!("scheduler lease check failed, skipping tick: {e}");
                false
            }
        }
    }

    /// Execute one scheduler tick — check and run due tasks.
    async fn tick(&mut self) {
        let due_ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.is_due())
            .map(|t| t.id.clone())
            .collect();

        let ran_any = !due_ids.is_empty();
        for task_id in due_ids {
            let Some(snapshot) = self.tasks.iter().find(|t| t.id == task_id).cloned() else {
                continue;
            };

            let started_at = tasks::now_epoch_secs();
            let (result, outcome) = self.execute_task(snapshot).await;
            let finished_at = tasks::now_epoch_secs();

            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
                match outcome {
                    TaskRunOutcome::Success => task.mark_run_success_at(finished_at),
                    TaskRunOutcome::Failure | TaskRunOutcome::SoftTimeout => {
                        task.mark_run_failure_at(finished_at, &result.summary());
                    }
                }
            }

            self.push_history(TaskRunRecord {
                task_id,
                started_at,
                finished_at,
                outcome,
                summary: result.summary(),
            });
        }

        if ran_any {
            self.save_state();
        }
    }

    /// Execute a single task under its soft timeout.
    async fn execute_task(&self, task: ScheduledTask) -> (TaskResult, TaskRunOutcome) {
        debug!("executing scheduled task: {}", task.id);

        let Some(executor) = &self.executor else {
            let result = TaskResult::Error(format!("no executor configured for task {}", task.id));
            return (result, TaskRunOutcome::Failure);
        };

        let task_id = task.id.clone();
        let soft_timeout_secs = task.soft_timeout_secs;
        let fut = (executor)(task);

        if soft_timeout_secs == 0 {
            let result = fut.await;
            let outcome = result.outcome();
            return (result, outcome);
        }

        match tokio::time::timeout(Duration::from_secs(soft_timeout_secs), fut).await {
            Ok(result) => {
                let outcome = result.outcome();
                (result, outcome)
            }
            Err(_) => {
                let msg =
                    format!("task {task_id} exceeded soft timeout ({soft_timeout_secs}s)");
                warn!("{msg}");
                (TaskResult::Error(msg), TaskRunOutcome::SoftTimeout)
            }
        }
    }

    fn push_history(&mut self, run: TaskRunRecord) {
        self.history.push(run);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if self.history.len() <= self.max_history_entries {
            return;
        }
        let drop_count = self.history.len().saturating_sub(self.max_history_entries);
        self.history.drain(0..drop_count);
    }
}

fn load_state_from_path(path: Option<&std::path::Path>) -> crate::Result<SchedulerState> {
    let Some(path) = path else {
        return Ok(SchedulerState::default());
    };

    let bytes = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SchedulerState::default());
        }
        Err(e) => {
            return Err(crate::WardenError::Scheduler(format!(
                "cannot read state: {e}"
            )));
        }
    };

    serde_json::from_slice(&bytes)
        .map_err(|e| crate::WardenError::Scheduler(format!("cannot parse state: {e}")))
}

fn save_state_to_path(
    path: Option<&std::path::Path>,
    state: &SchedulerState,
) -> crate::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| crate::WardenError::Scheduler(format!("cannot create state dir: {e}")))?;
    }

    let json = serde_json::to_string_pretty(state)
        .map_err(|e| crate::WardenError::Scheduler(format!("cannot serialize state: {e}")))?;

    std::fs::write(path, json)
        .map_err(|e| crate::WardenError::Scheduler(format!("cannot write state: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::scheduler::authority::{LeaderLeaseConfig, now_epoch_millis};
    use crate::scheduler::tasks::Schedule;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_scheduler() -> Scheduler {
        Scheduler::new().with_state_path(None)
    }

    fn counting_executor(calls: Arc<AtomicUsize>) -> TaskExecutor {
        Box::new(move |task| {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                TaskResult::Success(format!("ran {}", task.id))
            })
        })
    }

    #[test]
    fn new_scheduler_has_no_tasks() {
        let scheduler = make_scheduler();
        assert!(scheduler.tasks().is_empty());
    }

    #[test]
    fn register_is_idempotent() {
        let mut scheduler = make_scheduler();
        let task = ScheduledTask::new("t", "T", Schedule::Interval { secs: 86400 });

        assert!(scheduler.register(task.clone()));
        assert!(!scheduler.register(task));

        assert_eq!(scheduler.tasks().len(), 1);
        assert!(scheduler.is_registered("t"));
    }

    #[test]
    fn unregister_removes_and_blocks_resurrection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.json");

        // Persist a task, then unregister it before loading state.
        let mut first = Scheduler::new().with_state_path(Some(path.clone()));
        first.register(ScheduledTask::new(
            "t",
            "T",
            Schedule::Interval { secs: 60 },
        ));
        first.save_state();

        let mut second = Scheduler::new().with_state_path(Some(path));
        second.register(ScheduledTask::new(
            "t",
            "T",
            Schedule::Interval { secs: 60 },
        ));
        assert!(second.unregister("t"));
        second.load_state();
        assert!(!second.is_registered("t"));
    }

    #[tokio::test]
    async fn tick_executes_due_tasks_and_records_history() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = make_scheduler().with_executor(counting_executor(Arc::clone(&calls)));
        scheduler.register(ScheduledTask::new(
            "due",
            "Due Task",
            Schedule::Interval { secs: 0 },
        ));

        scheduler.tick().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.history().len(), 1);
        assert_eq!(scheduler.history()[0].task_id, "due");
        assert_eq!(scheduler.history()[0].outcome, TaskRunOutcome::Success);
        assert_eq!(scheduler.history()[0].summary, "ran due");
    }

    #[tokio::test]
    async fn tick_marks_failure_and_backoff() {
        let mut scheduler = make_scheduler().with_executor(Box::new(|_| {
            Box::pin(async { TaskResult::Error("boom".to_owned()) })
        }));

        let mut task = ScheduledTask::new("err", "Error Task", Schedule::Interval { secs: 0 });
        task.retry_backoff_secs = 1800;
        scheduler.register(task);

        scheduler.tick().await;

        let task = scheduler
            .tasks()
            .iter()
            .find(|t| t.id == "err")
            .expect("task exists");
        assert_eq!(task.failure_streak, 1);
        assert_eq!(task.last_error.as_deref(), Some("boom"));
        assert!(task.next_run.is_some());
        assert_eq!(scheduler.history()[0].outcome, TaskRunOutcome::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn soft_timeout_cuts_off_a_hung_task() {
        let mut scheduler = make_scheduler().with_executor(Box::new(|_| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                TaskResult::Success("never".to_owned())
            })
        }));

        let mut task = ScheduledTask::new("hung", "Hung Task", Schedule::Interval { secs: 0 });
        task.soft_timeout_secs = 5;
        scheduler.register(task);

        scheduler.tick().await;

        assert_eq!(scheduler.history().len(), 1);
        assert_eq!(scheduler.history()[0].outcome, TaskRunOutcome::SoftTimeout);
        let task = scheduler.tasks().iter().find(|t| t.id == "hung").unwrap();
        assert_eq!(task.failure_streak, 1);
    }

    #[tokio::test]
    async fn run_history_is_bounded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = make_scheduler()
            .with_executor(counting_executor(Arc::clone(&calls)))
            .with_history_limit(2);

        scheduler.register(ScheduledTask::new("a", "A", Schedule::Interval { secs: 0 }));
        scheduler.register(ScheduledTask::new("b", "B", Schedule::Interval { secs: 0 }));
        scheduler.register(ScheduledTask::new("c", "C", Schedule::Interval { secs: 0 }));

        scheduler.tick().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.history().len(), 2);
    }

    #[tokio::test]
    async fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.json");

        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new()
            .with_state_path(Some(path.clone()))
            .with_executor(counting_executor(Arc::clone(&calls)));
        scheduler.register(ScheduledTask::new(
            "t",
            "T",
            Schedule::Interval { secs: 86400 },
        ));
        scheduler.tick().await;

        let mut restored = Scheduler::new().with_state_path(Some(path));
        restored.register(ScheduledTask::new(
            "t",
            "T",
            Schedule::Interval { secs: 86400 },
        ));
        restored.load_state();

        let task = restored.tasks().iter().find(|t| t.id == "t").unwrap();
        assert!(task.last_run.is_some(), "last run survives restart");
        assert_eq!(restored.history().len(), 1);
    }

    #[test]
    fn follower_scheduler_skips_tick_when_leader_is_active() {
        let dir = tempfile::tempdir().unwrap();
        let lease_path = dir.path().join("scheduler.leader.lock");
        let cfg = LeaderLeaseConfig::default();

        let leader = LeaderLease::new("leader-a", 1001, lease_path.clone(), cfg);
        leader
            .try_acquire_or_renew_at(now_epoch_millis())
            .expect("acquire leader lease");

        let follower = LeaderLease::new("leader-b", 1002, lease_path, cfg);
        let scheduler = make_scheduler().with_leader_lease(follower);

        assert!(
            !scheduler.should_execute_tick(),
            "follower should skip tick while another leader lease is active"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_starts_and_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = make_scheduler().with_executor(counting_executor(Arc::clone(&calls)));
        scheduler.register(ScheduledTask::new(
            "async_test",
            "Async",
            Schedule::Interval { secs: 0 },
        ));

        let handle = scheduler.run();

        for _ in 0..100 {
            if calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(calls.load(Ordering::SeqCst) > 0);

        handle.abort();
    }

    #[tokio::test]
    async fn disabled_task_is_skipped_until_marked_due() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = make_scheduler().with_executor(counting_executor(Arc::clone(&calls)));
        scheduler.register(ScheduledTask::new(
            "toggled",
            "Toggled",
            Schedule::Interval { secs: 86400 },
        ));

        assert!(scheduler.set_task_enabled("toggled", false));
        scheduler.tick().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(scheduler.set_task_enabled("toggled", true));
        assert!(scheduler.mark_task_due_now("toggled"));
        scheduler.tick().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(!scheduler.set_task_enabled("missing", true));
        assert!(!scheduler.mark_task_due_now("missing"));
    }

    #[tokio::test]
    async fn deferred_task_is_not_due_at_boot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = make_scheduler().with_executor(counting_executor(Arc::clone(&calls)));

        let mut task = ScheduledTask::new("deferred", "Deferred", Schedule::Interval { secs: 86400 });
        task.registration.start_on_boot = false;
        scheduler.register(task);

        scheduler.prime_deferred_tasks();
        scheduler.tick().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let task = scheduler.tasks().iter().find(|t| t.id == "deferred").unwrap();
        assert!(task.last_run.is_some(), "interval anchored at startup");
    }
}
