//! Time source abstraction.
//!
//! TTL expiry and all persisted timestamps flow through the [`Clock`] trait
//! so that expiry behavior can be exercised with a simulated clock instead
//! of real sleeps.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

/// A source of "now".
pub trait Clock: Send + Sync {
    /// Current instant as UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current instant as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Current instant as an ISO-8601 string (RFC 3339).
    fn now_iso(&self) -> String {
        self.now().to_rfc3339()
    }
}

/// Wall-clock time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: Mutex<i64>,
}

impl ManualClock {
    /// Create a clock frozen at the given epoch-millis instant.
    pub fn at(millis: i64) -> Self {
        Self {
            millis: Mutex::new(millis),
        }
    }

    /// Advance the clock by `delta_millis`.
    pub fn advance(&self, delta_millis: i64) {
        let mut guard = self.millis.lock().expect("manual clock lock");
        *guard += delta_millis;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = *self.millis.lock().expect("manual clock lock");
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at(1_000);
        assert_eq!(clock.now_millis(), 1_000);

        clock.advance(500);
        assert_eq!(clock.now_millis(), 1_500);
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
    }

    #[test]
    fn iso_format_is_rfc3339() {
        let clock = ManualClock::at(0);
        assert!(clock.now_iso().starts_with("1970-01-01T00:00:00"));
    }
}
