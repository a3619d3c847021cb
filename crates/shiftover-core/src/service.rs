//! The three operations exposed to collaborators.
//!
//! `prepare_*` are the pure halves (truncate, validate, clamp to now) and are
//! shared with backends that run the same operations inside a caller-supplied
//! transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Result, ValidationErrors,
  document::Document,
  filter::{referenced_users, retain_existing_users},
  interval,
  schedule::TemporarySchedule,
  store::{ScheduleStore, UserDirectory},
  time::{clamp_to_now, truncate_minute},
  validate::{validate_clear_range, validate_temporary_schedule},
};

/// Truncate and validate `temp`, then trim off any part that has already
/// elapsed so it cannot claim time in the past.
pub fn prepare_set(temp: &TemporarySchedule, now: DateTime<Utc>) -> Result<TemporarySchedule> {
  let temp = temp.truncated();
  validate_temporary_schedule(&temp, now)?;
  temp
    .trim_start(truncate_minute(now))
    .ok_or_else(|| ValidationErrors::single("end", "must be in the future").into())
}

/// Truncate and validate a clear range; `start` is moved forward to now if it
/// has already passed.
pub fn prepare_clear(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
  let (start, end) = (truncate_minute(start), truncate_minute(end));
  validate_clear_range(start, end, now)?;
  Ok((clamp_to_now(start, now), end))
}

/// Mutation that inserts `temp` with override semantics.
pub fn set_mutation(temp: TemporarySchedule) -> impl FnOnce(Document) -> Result<Document> + Send + 'static {
  move |doc| {
    let list = interval::set(doc.temporary_schedules(), temp)?;
    Ok(doc.with_temporary_schedules(list))
  }
}

/// Mutation that clears `[start, end)`, splitting straddling entries.
pub fn clear_mutation(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> impl FnOnce(Document) -> Result<Document> + Send + 'static {
  move |doc| {
    let list = interval::clear(doc.temporary_schedules(), start, end);
    Ok(doc.with_temporary_schedules(list))
  }
}

/// The canonical view of a loaded document: stale users filtered, touching
/// windows merged.
pub async fn present<U>(users: &U, doc: &Document) -> Result<Vec<TemporarySchedule>, U::Error>
where
  U: UserDirectory,
{
  let list = doc.temporary_schedules();
  let referenced = referenced_users(list);
  if referenced.is_empty() {
    return Ok(interval::merge(list));
  }

  let wanted = referenced.len();
  let existing = users.existing_users(referenced.into_iter().collect()).await?;
  if existing.len() < wanted {
    tracing::debug!(hidden = wanted - existing.len(), "omitting shifts for deleted users");
  }
  Ok(interval::merge(&retain_existing_users(list, &existing)))
}

/// Current temporary schedules for `key`, as presented to callers.
pub async fn list_temporary_schedules<S, U>(
  store: &S,
  users: &U,
  key: Uuid,
) -> Result<Vec<TemporarySchedule>, S::Error>
where
  S: ScheduleStore,
  U: UserDirectory,
  S::Error: From<U::Error>,
{
  let doc = store.load(key).await?;
  Ok(present(users, &doc).await?)
}

/// Make `temp` the only override for its span, splitting or trimming any
/// existing windows it intersects.
pub async fn set_temporary_schedule<S>(
  store: &S,
  key: Uuid,
  temp: &TemporarySchedule,
) -> Result<(), S::Error>
where
  S: ScheduleStore,
{
  let temp = prepare_set(temp, Utc::now())?;
  store.apply(key, set_mutation(temp)).await
}

/// Remove all overrides between `start` and `end`, splitting windows that
/// straddle either bound.
pub async fn clear_temporary_schedules<S>(
  store: &S,
  key: Uuid,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Result<(), S::Error>
where
  S: ScheduleStore,
{
  let (start, end) = prepare_clear(start, end, Utc::now())?;
  store.apply(key, clear_mutation(start, end)).await
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;

  use super::*;
  use crate::schedule::Shift;

  fn now() -> DateTime<Utc> {
    "2030-01-01T10:20:30Z".parse().unwrap()
  }

  fn at(s: &str) -> DateTime<Utc> { s.parse().unwrap() }

  #[test]
  fn prepare_set_truncates_before_validating() {
    let a = Uuid::new_v4();
    let temp = TemporarySchedule::new(at("2030-01-01T11:00:59Z"), at("2030-01-01T12:00:59Z"), vec![
      Shift::new(at("2030-01-01T11:00:30Z"), at("2030-01-01T12:00:45Z"), a),
    ]);
    // Untruncated the shift would end after the window; truncated both agree.
    let prepared = prepare_set(&temp, now()).unwrap();
    assert_eq!(prepared.start, at("2030-01-01T11:00:00Z"));
    assert_eq!(prepared.end, at("2030-01-01T12:00:00Z"));
    assert_eq!(prepared.shifts[0].end, at("2030-01-01T12:00:00Z"));
  }

  #[test]
  fn prepare_set_clamps_elapsed_start() {
    let a = Uuid::new_v4();
    let temp = TemporarySchedule::new(at("2030-01-01T09:00:00Z"), at("2030-01-01T12:00:00Z"), vec![
      Shift::new(at("2030-01-01T09:00:00Z"), at("2030-01-01T10:00:00Z"), a),
      Shift::new(at("2030-01-01T10:00:00Z"), at("2030-01-01T12:00:00Z"), a),
    ]);
    let prepared = prepare_set(&temp, now()).unwrap();
    assert_eq!(prepared.start, at("2030-01-01T10:20:00Z"));
    assert_eq!(prepared.shifts, vec![Shift::new(
      at("2030-01-01T10:20:00Z"),
      at("2030-01-01T12:00:00Z"),
      a
    )]);
  }

  #[test]
  fn prepare_set_rejects_end_in_past() {
    let temp = TemporarySchedule::new(now() - TimeDelta::hours(2), now() - TimeDelta::hours(1), vec![]);
    let err = prepare_set(&temp, now()).unwrap_err();
    assert!(err.validation().unwrap().has_field("end"));
  }

  #[test]
  fn prepare_clear_clamps_and_truncates() {
    let (start, end) = prepare_clear(at("2030-01-01T08:00:00Z"), at("2030-01-01T12:30:45Z"), now()).unwrap();
    assert_eq!(start, at("2030-01-01T10:20:00Z"));
    assert_eq!(end, at("2030-01-01T12:30:00Z"));
  }

  #[test]
  fn prepare_clear_reports_all_problems() {
    let err = prepare_clear(now(), now() - TimeDelta::hours(1), now()).unwrap_err();
    assert_eq!(err.validation().unwrap().errors().len(), 2);
  }
}
