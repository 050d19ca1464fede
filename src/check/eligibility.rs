//! Eligibility filters for the check cycles.
//!
//! Pure functions from a fetched record set to the subset that triggers an
//! action. Records with a missing or malformed date are skipped, never
//! errors.

use crate::dates;
use crate::records::{DomainRecord, PasswordRecord};
use chrono::{DateTime, NaiveDate, Utc};

/// Domains whose remaining days exactly match one of `thresholds`.
///
/// Exact match, not a range: a domain at 29 days is not eligible and will
/// not be warned about until (and unless) a cycle runs on a threshold day.
/// Returns each eligible record paired with its computed remaining days.
#[must_use]
pub fn eligible_domains(
    domains: &[DomainRecord],
    now: DateTime<Utc>,
    thresholds: &[i64],
) -> Vec<(DomainRecord, i64)> {
    domains
        .iter()
        .filter_map(|domain| {
            let date = domain.date.as_deref()?;
            let days_left = dates::days_until(now, date)?;
            thresholds
                .contains(&days_left)
                .then(|| (domain.clone(), days_left))
        })
        .collect()
}

/// Passwords created on a calendar day before `today`.
#[must_use]
pub fn stale_passwords(passwords: &[PasswordRecord], today: NaiveDate) -> Vec<PasswordRecord> {
    passwords
        .iter()
        .filter(|password| {
            password
                .created_at
                .as_deref()
                .is_some_and(|created| dates::is_stale(created, today))
        })
        .cloned()
        .collect()
}
