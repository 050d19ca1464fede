//! Scheduler authority: single-writer leadership.
//!
//! The record store and the notification channel must not be driven by
//! two overlapping check cycles, and nothing guarantees only one daemon
//! instance exists on a host. Before each tick the runner acquires a
//! file-backed lease; followers skip the tick. Leadership is taken over
//! when a peer's lease expires without renewal.

use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Leadership lease timing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderLeaseConfig {
    /// Lease lifetime in seconds.
    pub ttl_secs: u64,
    /// Expected heartbeat interval in seconds.
    pub heartbeat_secs: u64,
}

impl Default for LeaderLeaseConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 180,
            heartbeat_secs: 60,
        }
    }
}

/// Result of a lease renewal/acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadershipDecision {
    /// This instance owns leadership after the attempt.
    Leader {
        /// `true` when leadership was taken over from an expired peer.
        takeover: bool,
    },
    /// Another instance currently owns leadership.
    Follower {
        /// Instance id of the current leader.
        leader_instance_id: String,
        /// When the current lease expires (epoch milliseconds).
        lease_expires_at: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LeaderLeaseRecord {
    instance_id: String,
    pid: u32,
    started_at: u64,
    heartbeat_at: u64,
    lease_expires_at: u64,
}

/// File-backed leader lease ensuring a single active scheduler.
pub struct LeaderLease {
    instance_id: String,
    pid: u32,
    lease_path: PathBuf,
    config: LeaderLeaseConfig,
}

impl LeaderLease {
    /// Create a new leader lease controller for one daemon instance.
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        pid: u32,
        lease_path: PathBuf,
        config: LeaderLeaseConfig,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            pid,
            lease_path,
            config,
        }
    }

    /// Try to acquire or renew leadership now.
    pub fn try_acquire_or_renew(&self) -> Result<LeadershipDecision> {
        self.try_acquire_or_renew_at(now_epoch_millis())
    }

    /// Try to acquire or renew leadership at the given epoch-millisecond
    /// time.
    pub fn try_acquire_or_renew_at(&self, now_ms: u64) -> Result<LeadershipDecision> {
        let ttl_ms = self.config.ttl_secs.saturating_mul(1000);
        let existing = read_lease_record(&self.lease_path)?;

        match existing {
            None => {
                let record = self.build_record(now_ms, now_ms, now_ms.saturating_add(ttl_ms));
                write_lease_record(&self.lease_path, &record)?;
                Ok(LeadershipDecision::Leader { takeover: false })
            }
            Some(existing) if existing.instance_id == self.instance_id => {
                let record =
                    self.build_record(existing.started_at, now_ms, now_ms.saturating_add(ttl_ms));
                write_lease_record(&self.lease_path, &record)?;
                Ok(LeadershipDecision::Leader { takeover: false })
            }
            Some(existing) if existing.lease_expires_at <= now_ms => {
                let record = self.build_record(now_ms, now_ms, now_ms.saturating_add(ttl_ms));
                write_lease_record(&self.lease_path, &record)?;
                Ok(LeadershipDecision::Leader { takeover: true })
            }
            Some(existing) => Ok(LeadershipDecision::Follower {
                leader_instance_id: existing.instance_id,
                lease_expires_at: existing.lease_expires_at,
            }),
        }
    }

    fn build_record(
        &self,
        started_at: u64,
        heartbeat_at: u64,
        lease_expires_at: u64,
    ) -> LeaderLeaseRecord {
        LeaderLeaseRecord {
            instance_id: self.instance_id.clone(),
            pid: self.pid,
            started_at,
            heartbeat_at,
            lease_expires_at,
        }
    }
}

fn read_lease_record(path: &PathBuf) -> Result<Option<LeaderLeaseRecord>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(WardenError::Scheduler(format!(
                "failed to read scheduler leader lease: {e}"
            )));
        }
    };

    match serde_json::from_slice::<LeaderLeaseRecord>(&bytes) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!(
                "ignoring malformed scheduler leader lease at {}: {e}",
                path.display()
            );
            Ok(None)
        }
    }
}

fn write_lease_record(path: &PathBuf, record: &LeaderLeaseRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            WardenError::Scheduler(format!("failed to create scheduler lease directory: {e}"))
        })?;
    }

    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_vec(record)
        .map_err(|e| WardenError::Scheduler(format!("failed to serialize scheduler lease: {e}")))?;
    std::fs::write(&tmp_path, json).map_err(|e| {
        WardenError::Scheduler(format!("failed to write scheduler lease temp file: {e}"))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        WardenError::Scheduler(format!("failed to finalize scheduler lease file: {e}"))
    })?;
    Ok(())
}

/// Current epoch time in milliseconds.
#[must_use]
pub fn now_epoch_millis() -> u64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        Err(_) => 0,
    }
}
