//! Timestamp type used throughout the faucet.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Ledger block times arrive in
//! seconds and are widened on the way in.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one hour.
pub const HOUR_MS: u64 = 60 * 60 * 1000;

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the epoch reads as `EPOCH`.
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// Milliseconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// This timestamp shifted forward by `ms`.
    pub fn plus_millis(&self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_ms: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_ms)
    }

    /// Parse an RFC 3339 / ISO-8601 date-time. Instants before the epoch are rejected.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).ok()?;
        let ms = dt.timestamp_millis();
        (ms >= 0).then_some(Self(ms as u64))
    }

    /// Render as an ISO-8601 string with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
    pub fn to_rfc3339(&self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.0 as i64) {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.0.to_string(),
        }
    }
}

/// Source of the current time. Swapped for a controllable clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_round_trip() {
        let ts = Timestamp::parse_rfc3339("2024-05-01T12:00:00.000Z").unwrap();
        assert_eq!(ts.as_millis(), 1_714_564_800_000);
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn offset_date_times_are_normalised() {
        let ts = Timestamp::parse_rfc3339("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(ts, Timestamp::from_secs(1_714_564_800));
    }

    #[test]
    fn garbage_and_pre_epoch_rejected() {
        assert!(Timestamp::parse_rfc3339("yesterday").is_none());
        assert!(Timestamp::parse_rfc3339("1960-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn expiry_is_inclusive() {
        let t = Timestamp::from_millis(1_000);
        assert!(!t.has_expired(500, Timestamp::from_millis(1_499)));
        assert!(t.has_expired(500, Timestamp::from_millis(1_500)));
    }
}
