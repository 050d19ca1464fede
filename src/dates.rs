//! Date arithmetic for record eligibility.
//!
//! Two questions are answered here: how many whole days remain until a
//! domain's expiry date, and whether a support password's creation date
//! falls on an earlier calendar day than today. Record dates arrive as
//! strings from the record store; malformed values map to `None`/`false`
//! so a bad record can never fail a check cycle.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Parse a record date string.
///
/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date
/// (interpreted as midnight UTC), the two forms the record store serves.
#[must_use]
pub fn parse_record_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

/// Whole days remaining until `target`, rounded up.
///
/// `ceil((target − now) / 86_400_000 ms)`: a domain expiring at midnight in
/// 29.5 days reports 30. Negative for past dates. `None` when the target
/// string does not parse.
#[must_use]
pub fn days_until(now: DateTime<Utc>, target: &str) -> Option<i64> {
    let target = parse_record_date(target)?;
    let diff_ms = target.timestamp_millis() - now.timestamp_millis();
    let mut days = diff_ms.div_euclid(MILLIS_PER_DAY);
    if diff_ms.rem_euclid(MILLIS_PER_DAY) > 0 {
        days += 1;
    }
    Some(days)
}

/// Whether `created` falls on a calendar day strictly before `today`.
///
/// Both sides are compared at day granularity, so a record created at any
/// time today — including exactly midnight — is not stale. Malformed
/// creation dates are treated as not stale.
#[must_use]
pub fn is_stale(created: &str, today: NaiveDate) -> bool {
    match parse_record_date(created) {
        Some(instant) => instant.date_naive() < today,
        None => false,
    }
}
