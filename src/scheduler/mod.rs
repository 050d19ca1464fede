//! Background task scheduler.
//!
//! Runs the periodic maintenance checks (domain expiry warnings, support
//! password cleanup) on a tick loop, with persisted task state, bounded
//! run history, and a leader lease so only one daemon instance executes
//! cycles at a time.

pub mod authority;
pub mod runner;
pub mod tasks;

pub use authority::{LeaderLease, LeaderLeaseConfig};
pub use runner::Scheduler;
pub use tasks::{RegistrationOptions, Schedule, ScheduledTask, TaskResult};
