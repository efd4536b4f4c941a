// src/utils/time.rs

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};

/// Timestamp layout written by earlier versions of the bot (local time, no zone).
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Source of "now" for cooldown arithmetic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whole minutes (rounded up, at least 1) until `cooldown_minutes` have passed
/// since `since`, or `None` once the cooldown is over.
pub fn minutes_remaining(
    since: DateTime<Utc>,
    now: DateTime<Utc>,
    cooldown_minutes: u32,
) -> Option<u64> {
    const MILLIS_PER_MINUTE: i64 = 60_000;

    let elapsed_ms = (now - since).num_milliseconds().max(0);
    let cooldown_ms = i64::from(cooldown_minutes) * MILLIS_PER_MINUTE;
    let remaining_ms = cooldown_ms - elapsed_ms;
    if remaining_ms <= 0 {
        return None;
    }
    Some(((remaining_ms + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE) as u64)
}

/// Serde adapter for `last_claimed`: writes RFC 3339 UTC keeping any
/// sub-second digits, reads RFC 3339 or the legacy `"%d %b %Y %H:%M:%S"`
/// layout (taken as UTC).
pub mod claim_timestamp {
    use super::LEGACY_TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|e| format!("invalid claim timestamp {:?}: {}", raw, e))
    }
}
