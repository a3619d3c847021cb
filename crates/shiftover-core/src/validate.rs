//! Validation of submitted temporary schedules.
//!
//! Every rule is checked and every violation reported; nothing here stops at
//! the first problem. Callers truncate timestamps first (see
//! [`TemporarySchedule::truncated`]) so that validated and stored values agree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  FieldError, ValidationErrors,
  schedule::{Shift, TemporarySchedule},
  time::{MIN_LEAD_MINUTES, is_sufficiently_future},
};

/// Maximum number of shifts a single temporary schedule may hold.
pub const MAX_SHIFTS_PER_TEMPORARY_SCHEDULE: usize = 150;

/// `t` must be more than [`MIN_LEAD_MINUTES`] after `now`.
pub fn validate_future(field: &str, t: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), FieldError> {
  if is_sufficiently_future(t, now) {
    Ok(())
  } else {
    Err(FieldError::new(field, format!("must be at least {MIN_LEAD_MINUTES} min in the future")))
  }
}

/// `start` must come strictly before `end`. Reported against `{prefix}end`.
pub fn validate_time_range(
  prefix: &str,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Result<(), FieldError> {
  if start < end {
    Ok(())
  } else {
    Err(FieldError::new(format!("{prefix}end"), "must be after start"))
  }
}

/// Check shifts against the parent window `[start, end)`, the capacity
/// `limit`, and same-user overlap.
pub fn validate_shifts(
  field: &str,
  limit: usize,
  shifts: &[Shift],
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Vec<FieldError> {
  let mut errors = Vec::new();

  if shifts.len() > limit {
    errors.push(FieldError::new(field, format!("must not have more than {limit} shifts")));
  }

  let mut by_user: HashMap<Uuid, Vec<usize>> = HashMap::new();
  for (i, shift) in shifts.iter().enumerate() {
    let prefix = format!("{field}[{i}].");
    if let Err(e) = validate_time_range(&prefix, shift.start, shift.end) {
      errors.push(e);
      continue;
    }
    if shift.start < start {
      errors.push(FieldError::new(format!("{prefix}start"), "must not be before temporary schedule start"));
    }
    if shift.end > end {
      errors.push(FieldError::new(format!("{prefix}end"), "must not be after temporary schedule end"));
    }
    by_user.entry(shift.user_id).or_default().push(i);
  }

  let mut overlaps = Vec::new();
  for indexes in by_user.values_mut() {
    indexes.sort_by_key(|&i| (shifts[i].start, i));
    // The earlier shift reaching furthest right; every later shift starting
    // before its end overlaps it.
    let mut reach: Option<usize> = None;
    for &cur in indexes.iter() {
      match reach {
        Some(prev) if shifts[cur].start < shifts[prev].end => {
          overlaps.push((cur, prev));
          if shifts[cur].end > shifts[prev].end {
            reach = Some(cur);
          }
        }
        _ => reach = Some(cur),
      }
    }
  }
  // HashMap order is arbitrary; report overlaps in submission order.
  overlaps.sort_unstable();
  errors.extend(overlaps.into_iter().map(|(cur, prev)| {
    FieldError::new(format!("{field}[{cur}]"), format!("overlaps shift {prev} for the same user"))
  }));

  errors
}

/// Validate an already-truncated temporary schedule as of `now`.
pub fn validate_temporary_schedule(
  temp: &TemporarySchedule,
  now: DateTime<Utc>,
) -> Result<(), ValidationErrors> {
  let mut errors: Vec<FieldError> = [
    validate_future("end", temp.end, now),
    validate_time_range("", temp.start, temp.end),
  ]
  .into_iter()
  .filter_map(Result::err)
  .collect();

  errors.extend(validate_shifts(
    "shifts",
    MAX_SHIFTS_PER_TEMPORARY_SCHEDULE,
    &temp.shifts,
    temp.start,
    temp.end,
  ));

  ValidationErrors::check(errors)
}

/// Validate a clear request as of `now`.
pub fn validate_clear_range(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  now: DateTime<Utc>,
) -> Result<(), ValidationErrors> {
  let errors = [validate_future("end", end, now), validate_time_range("", start, end)]
    .into_iter()
    .filter_map(Result::err)
    .collect();
  ValidationErrors::check(errors)
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;

  use super::*;

  fn now() -> DateTime<Utc> {
    chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
      .unwrap()
      .and_hms_opt(8, 0, 0)
      .unwrap()
      .and_utc()
  }

  fn at(h: u32, m: u32) -> DateTime<Utc> {
    chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
      .unwrap()
      .and_hms_opt(h, m, 0)
      .unwrap()
      .and_utc()
  }

  #[test]
  fn valid_schedule_passes() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let temp = TemporarySchedule::new(at(10, 0), at(12, 0), vec![
      Shift::new(at(10, 0), at(11, 0), a),
      Shift::new(at(10, 0), at(12, 0), b),
      Shift::new(at(11, 0), at(12, 0), a),
    ]);
    validate_temporary_schedule(&temp, now()).unwrap();
  }

  #[test]
  fn end_too_close_to_now() {
    let temp = TemporarySchedule::new(now() - TimeDelta::hours(1), now() + TimeDelta::minutes(5), vec![]);
    let err = validate_temporary_schedule(&temp, now()).unwrap_err();
    assert_eq!(err.errors(), &[FieldError::new("end", "must be at least 5 min in the future")]);
  }

  #[test]
  fn inverted_range() {
    let temp = TemporarySchedule::new(at(12, 0), at(10, 0), vec![]);
    let err = validate_temporary_schedule(&temp, now()).unwrap_err();
    assert!(err.has_field("end"));
  }

  #[test]
  fn capacity_and_bounds_reported_together() {
    let a = Uuid::new_v4();
    let mut shifts: Vec<Shift> = (0..151)
      .map(|_| Shift::new(at(10, 0), at(10, 30), Uuid::new_v4()))
      .collect();
    shifts.push(Shift::new(at(9, 0), at(10, 0), a));

    let temp = TemporarySchedule::new(at(10, 0), at(12, 0), shifts);
    let err = validate_temporary_schedule(&temp, now()).unwrap_err();

    assert!(err.has_field("shifts"), "{err}");
    assert!(err.has_field("shifts[151].start"), "{err}");
  }

  #[test]
  fn exactly_at_capacity_is_fine() {
    let shifts = (0..MAX_SHIFTS_PER_TEMPORARY_SCHEDULE)
      .map(|_| Shift::new(at(10, 0), at(11, 0), Uuid::new_v4()))
      .collect();
    let temp = TemporarySchedule::new(at(10, 0), at(12, 0), shifts);
    validate_temporary_schedule(&temp, now()).unwrap();
  }

  #[test]
  fn empty_and_escaping_shifts() {
    let a = Uuid::new_v4();
    let temp = TemporarySchedule::new(at(10, 0), at(12, 0), vec![
      Shift::new(at(11, 0), at(11, 0), a),
      Shift::new(at(11, 0), at(13, 0), Uuid::new_v4()),
    ]);
    let err = validate_temporary_schedule(&temp, now()).unwrap_err();
    assert_eq!(err.errors(), &[
      FieldError::new("shifts[0].end", "must be after start"),
      FieldError::new("shifts[1].end", "must not be after temporary schedule end"),
    ]);
  }

  #[test]
  fn same_user_overlap() {
    let a = Uuid::new_v4();
    let temp = TemporarySchedule::new(at(10, 0), at(12, 0), vec![
      Shift::new(at(10, 0), at(11, 0), a),
      Shift::new(at(11, 0), at(12, 0), Uuid::new_v4()),
      Shift::new(at(10, 30), at(11, 30), a),
    ]);
    let err = validate_temporary_schedule(&temp, now()).unwrap_err();
    assert_eq!(err.errors(), &[FieldError::new("shifts[2]", "overlaps shift 0 for the same user")]);
  }

  #[test]
  fn overlap_with_an_earlier_long_shift_is_reported_for_each() {
    let a = Uuid::new_v4();
    let temp = TemporarySchedule::new(at(10, 0), at(14, 0), vec![
      Shift::new(at(10, 0), at(13, 0), a),
      Shift::new(at(11, 0), at(12, 0), a),
      Shift::new(at(12, 30), at(12, 45), a),
      Shift::new(at(13, 0), at(14, 0), a),
    ]);
    let err = validate_temporary_schedule(&temp, now()).unwrap_err();
    assert_eq!(err.errors(), &[
      FieldError::new("shifts[1]", "overlaps shift 0 for the same user"),
      FieldError::new("shifts[2]", "overlaps shift 0 for the same user"),
    ]);
  }

  #[test]
  fn clear_range_aggregates() {
    let err = validate_clear_range(at(7, 0), at(6, 0), now()).unwrap_err();
    assert_eq!(err.errors().len(), 2);
    validate_clear_range(at(7, 0), at(9, 0), now()).unwrap();
  }
}
