//! Injectable time source.
//!
//! Every date decision in the crate goes through a [`Clock`] so that
//! eligibility and idempotency logic is deterministic under test.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current UTC calendar date.
    fn today_utc(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Parse an RFC 3339 instant into a fixed clock.
    ///
    /// # Panics
    ///
    /// Panics on an unparsable instant; intended for test setup only.
    #[must_use]
    pub fn at(instant: &str) -> Self {
        let parsed = DateTime::parse_from_rfc3339(instant)
            .unwrap_or_else(|e| panic!("invalid fixed clock instant {instant:?}: {e}"));
        Self(parsed.with_timezone(&Utc))
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now_utc();
        let b = clock.now_utc();
        assert!(b >= a);
    }

    #[test]
    fn fixed_clock_is_pinned() {
        let clock = FixedClock::at("2025-01-01T00:00:00Z");
        assert_eq!(clock.now_utc(), clock.now_utc());
        assert_eq!(clock.today_utc().to_string(), "2025-01-01");
    }

    #[test]
    fn today_is_the_calendar_date_of_now() {
        let clock = FixedClock::at("2025-06-15T23:59:59Z");
        assert_eq!(clock.today_utc().to_string(), "2025-06-15");
    }
}
