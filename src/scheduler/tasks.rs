//! Scheduled task definitions.
//!
//! Defines the [`ScheduledTask`] type, [`Schedule`] enum for timing, the
//! [`RegistrationOptions`] recorded at registration time, and the run
//! result/history types the runner persists.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// How often a task should run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Run every N seconds.
    Interval {
        /// Interval in seconds between runs.
        secs: u64,
    },
    /// Run once daily at a given hour and minute (UTC).
    Daily {
        /// Hour of day (0-23, UTC).
        hour: u8,
        /// Minute of hour (0-59).
        min: u8,
    },
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval { secs } => {
                if *secs >= 3600 {
                    write!(f, "every {} hours", secs / 3600)
                } else {
                    write!(f, "every {} minutes", secs / 60)
                }
            }
            Self::Daily { hour, min } => write!(f, "daily at {hour:02}:{min:02} UTC"),
        }
    }
}

/// Options fixed at registration time.
///
/// Mirrors the host-scheduler registration surface: a floor on the
/// trigger interval, whether the unit outlives the registering process
/// (realized here by persisting task state across restarts), and whether
/// a never-run task is due immediately at startup or only after one full
/// interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationOptions {
    /// Minimum seconds between triggers, regardless of schedule.
    pub minimum_interval_secs: u64,
    /// Keep the registration when the registering process exits.
    pub continue_after_terminate: bool,
    /// Evaluate the task on the first tick after startup.
    pub start_on_boot: bool,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self {
            minimum_interval_secs: 0,
            continue_after_terminate: true,
            start_on_boot: true,
        }
    }
}

impl RegistrationOptions {
    /// Registration for a daily maintenance unit: at most one trigger per
    /// calendar day, surviving restarts, due at boot.
    #[must_use]
    pub fn daily() -> Self {
        Self {
            minimum_interval_secs: 86_400,
            continue_after_terminate: true,
            start_on_boot: true,
        }
    }
}

/// Outcome of executing a scheduled task.
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed with a summary message.
    Success(String),
    /// Task failed with an error message.
    Error(String),
}

impl TaskResult {
    /// Human-readable summary for logs and run history.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Success(msg) | Self::Error(msg) => msg.clone(),
        }
    }

    /// History outcome for this result.
    #[must_use]
    pub fn outcome(&self) -> TaskRunOutcome {
        match self {
            Self::Success(_) => TaskRunOutcome::Success,
            Self::Error(_) => TaskRunOutcome::Failure,
        }
    }
}

/// Recorded outcome of one task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunOutcome {
    /// The run completed.
    Success,
    /// The run returned an error.
    Failure,
    /// The run was cut off by its soft timeout.
    SoftTimeout,
}

/// One entry of the persisted run history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRunRecord {
    /// Task that ran.
    pub task_id: String,
    /// Unix epoch seconds when the run started.
    pub started_at: u64,
    /// Unix epoch seconds when the run finished.
    pub finished_at: u64,
    /// How the run ended.
    pub outcome: TaskRunOutcome,
    /// Result summary.
    pub summary: String,
}

/// A task that runs on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task identifier (e.g. `"domain_expiry"`).
    pub id: String,
    /// Human-readable task name.
    pub name: String,
    /// When to run this task.
    pub schedule: Schedule,
    /// Options fixed at registration time.
    #[serde(default)]
    pub registration: RegistrationOptions,
    /// Unix epoch seconds of the last run, if any.
    pub last_run: Option<u64>,
    /// Whether the task is enabled.
    pub enabled: bool,
    /// Soft deadline for one run in seconds; 0 disables it.
    #[serde(default)]
    pub soft_timeout_secs: u64,
    /// Delay before retrying after a failed run; 0 falls back to the
    /// schedule.
    #[serde(default)]
    pub retry_backoff_secs: u64,
    /// Forced next-due time; overrides the schedule when set.
    #[serde(default)]
    pub next_run: Option<u64>,
    /// Consecutive failed runs.
    #[serde(default)]
    pub failure_streak: u32,
    /// Error message of the most recent failed run.
    #[serde(default)]
    pub last_error: Option<String>,
}

impl ScheduledTask {
    /// Create a new enabled task with the given schedule.
    pub fn new(id: impl Into<String>, name: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schedule,
            registration: RegistrationOptions::default(),
            last_run: None,
            enabled: true,
            soft_timeout_secs: 0,
            retry_backoff_secs: 0,
            next_run: None,
            failure_streak: 0,
            last_error: None,
        }
    }

    /// Returns `true` if the task is enabled and due to run.
    #[must_use]
    pub fn is_due(&self) -> bool {
        self.is_due_at(now_epoch_secs())
    }

    /// Due check against an explicit epoch time.
    #[must_use]
    pub fn is_due_at(&self, now: u64) -> bool {
        if !self.enabled {
            return false;
        }

        if let Some(next) = self.next_run {
            return now >= next;
        }

        match &self.schedule {
            Schedule::Interval { secs } => {
                let interval = (*secs).max(self.registration.minimum_interval_secs);
                match self.last_run {
                    None => self.registration.start_on_boot,
                    Some(last) => now.saturating_sub(last) >= interval,
                }
            }
            Schedule::Daily { hour, min } => {
                let day_secs = u64::from(*hour) * 3600 + u64::from(*min) * 60;
                let today_start = now - (now % 86400);
                let scheduled = today_start + day_secs;

                match self.last_run {
                    None => self.registration.start_on_boot && now >= scheduled,
                    Some(last) => last < scheduled && now >= scheduled,
                }
            }
        }
    }

    /// Record a successful run at the given time.
    pub fn mark_run_success_at(&mut self, now: u64) {
        self.last_run = Some(now);
        self.next_run = None;
        self.failure_streak = 0;
        self.last_error = None;
    }

    /// Record a failed run at the given time; schedules a backoff retry
    /// when `retry_backoff_secs` is set.
    pub fn mark_run_failure_at(&mut self, now: u64, error: &str) {
        self.last_run = Some(now);
        self.failure_streak += 1;
        self.last_error = Some(error.to_owned());
        self.next_run = if self.retry_backoff_secs > 0 {
            Some(now.saturating_add(self.retry_backoff_secs))
        } else {
            None
        };
    }

    /// Force the task due on the next tick.
    pub fn mark_due_now(&mut self) {
        self.next_run = Some(now_epoch_secs());
    }
}

/// Returns current UTC seconds since epoch.
#[must_use]
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
