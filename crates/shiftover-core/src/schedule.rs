//! Temporary schedules and their shifts.
//!
//! Both are half-open intervals `[start, end)`. A shift belongs to exactly one
//! temporary schedule and must lie inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::truncate_minute;

/// A user's assignment for a span of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
  pub start:   DateTime<Utc>,
  pub end:     DateTime<Utc>,
  #[serde(rename = "userID")]
  pub user_id: Uuid,
}

impl Shift {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, user_id: Uuid) -> Self {
    Self { start, end, user_id }
  }

  pub fn overlaps(&self, other: &Shift) -> bool {
    self.start < other.end && other.start < self.end
  }

  /// The part of this shift inside `[start, end)`, if any.
  pub fn clip(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Shift> {
    let s = self.start.max(start);
    let e = self.end.min(end);
    (s < e).then(|| Shift::new(s, e, self.user_id))
  }
}

/// A window that overrides the normal rotation with exactly `shifts`.
///
/// An empty `shifts` list is meaningful: nobody is on call for the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporarySchedule {
  pub start:  DateTime<Utc>,
  pub end:    DateTime<Utc>,
  #[serde(default)]
  pub shifts: Vec<Shift>,
}

impl TemporarySchedule {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, shifts: Vec<Shift>) -> Self {
    Self { start, end, shifts }
  }

  /// `true` if the window shares any instant with `[start, end)`.
  pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    self.start < end && start < self.end
  }

  /// Restrict the window and its shifts to `[start, end)`.
  ///
  /// Shifts falling wholly outside the new bounds are dropped, the rest are
  /// cut to fit. Returns `None` if nothing of the window remains.
  pub fn clip(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
    let s = self.start.max(start);
    let e = self.end.min(end);
    if s >= e {
      return None;
    }
    let shifts = self.shifts.iter().filter_map(|sh| sh.clip(s, e)).collect();
    Some(Self::new(s, e, shifts))
  }

  /// The part of the window at or after `t`.
  pub fn trim_start(&self, t: DateTime<Utc>) -> Option<Self> {
    self.clip(t, self.end)
  }

  /// The part of the window before `t`.
  pub fn trim_end(&self, t: DateTime<Utc>) -> Option<Self> {
    self.clip(self.start, t)
  }

  /// A copy with every timestamp truncated to the minute.
  pub fn truncated(&self) -> Self {
    Self {
      start:  truncate_minute(self.start),
      end:    truncate_minute(self.end),
      shifts: self
        .shifts
        .iter()
        .map(|s| Shift::new(truncate_minute(s.start), truncate_minute(s.end), s.user_id))
        .collect(),
    }
  }
}
