//! Read-time removal of shifts whose user no longer exists.
//!
//! The stored document is never rewritten for this; only the returned view is
//! pruned.

use std::collections::{BTreeSet, HashSet};

use uuid::Uuid;

use crate::schedule::TemporarySchedule;

/// Every user referenced by a shift in `list`.
pub fn referenced_users(list: &[TemporarySchedule]) -> BTreeSet<Uuid> {
  list
    .iter()
    .flat_map(|t| t.shifts.iter().map(|s| s.user_id))
    .collect()
}

/// Drop shifts for users not in `existing`. Windows themselves are kept even
/// if they end up with no shifts.
pub fn retain_existing_users(
  list: &[TemporarySchedule],
  existing: &HashSet<Uuid>,
) -> Vec<TemporarySchedule> {
  list
    .iter()
    .map(|t| TemporarySchedule {
      start:  t.start,
      end:    t.end,
      shifts: t
        .shifts
        .iter()
        .filter(|s| existing.contains(&s.user_id))
        .cloned()
        .collect(),
    })
    .collect()
}
