//! Minute-granularity time helpers.
//!
//! Every timestamp is truncated with [`truncate_minute`] before validation so
//! that what is validated is exactly what is stored.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

/// How far ahead of "now" the end of a window must be.
pub const MIN_LEAD_MINUTES: i64 = 5;

/// Drop seconds and sub-second precision.
pub fn truncate_minute(t: DateTime<Utc>) -> DateTime<Utc> {
  t.with_nanosecond(0)
    .and_then(|t| t.with_second(0))
    .unwrap_or(t)
}

/// `true` if `t` is strictly more than [`MIN_LEAD_MINUTES`] after `now`.
pub fn is_sufficiently_future(t: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  t - now > TimeDelta::minutes(MIN_LEAD_MINUTES)
}

/// Move `t` forward to `now` (minute-truncated) if it has already passed.
pub fn clamp_to_now(t: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
  t.max(truncate_minute(now))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
  }

  #[test]
  fn truncates_seconds_and_nanos() {
    assert_eq!(
      truncate_minute(at("2030-01-01T10:15:42.123456789Z")),
      at("2030-01-01T10:15:00Z"),
    );
  }

  #[test]
  fn truncation_is_idempotent() {
    let t = truncate_minute(at("2030-01-01T10:15:42Z"));
    assert_eq!(truncate_minute(t), t);
  }

  #[test]
  fn future_requires_more_than_five_minutes() {
    let now = at("2030-01-01T10:00:00Z");
    assert!(!is_sufficiently_future(at("2030-01-01T10:05:00Z"), now));
    assert!(is_sufficiently_future(at("2030-01-01T10:05:01Z"), now));
    assert!(!is_sufficiently_future(at("2030-01-01T09:00:00Z"), now));
  }

  #[test]
  fn clamp_only_moves_forward() {
    let now = at("2030-01-01T10:00:30Z");
    assert_eq!(clamp_to_now(at("2030-01-01T09:00:00Z"), now), at("2030-01-01T10:00:00Z"));
    assert_eq!(clamp_to_now(at("2030-01-01T11:00:00Z"), now), at("2030-01-01T11:00:00Z"));
  }
}
