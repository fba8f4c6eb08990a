//! Clock abstraction so expiry logic is deterministic under test.
//!
//! Credentials carry unix-second timestamps; codes carry `DateTime<Utc>`.
//! The trait serves both.

use chrono::{DateTime, Utc};
#[cfg(any(test, feature = "test-seams"))]
use chrono::TimeZone;

/// Source of current time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current time as unix seconds (credential claim resolution).
    fn now_unix(&self) -> i64 {
        self.now_utc().timestamp()
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

/// Frozen clock for deterministic tests.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    now: DateTime<Utc>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Freeze at the given instant.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Freeze at a unix-seconds timestamp.
    pub fn at_unix(secs: i64) -> Self {
        Self {
            now: Utc.timestamp_opt(secs, 0).single().expect("valid unix timestamp"),
        }
    }

    /// Move the frozen instant forward.
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now += duration;
    }

    /// Move the frozen instant forward by whole seconds.
    pub fn advance_secs(&mut self, secs: i64) {
        self.advance(chrono::Duration::seconds(secs));
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }
}
