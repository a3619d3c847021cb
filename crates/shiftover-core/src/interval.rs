//! Interval algebra over the canonical list of temporary schedules.
//!
//! A canonical list is sorted by `start` and pairwise non-overlapping. All
//! functions here take a slice and return a freshly built list.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  schedule::{Shift, TemporarySchedule},
};

/// Insert `window`, superseding whatever previously covered its span.
///
/// Entries intersecting the window keep only the parts before and after it,
/// with their shifts clipped to match.
pub fn set(
  list: &[TemporarySchedule],
  window: TemporarySchedule,
) -> Result<Vec<TemporarySchedule>> {
  let mut result = clear(list, window.start, window.end);
  result.push(window);
  result.sort_by_key(|t| t.start);
  check_canonical(&result)?;
  Ok(result)
}

/// Remove `[start, end)` from every entry, splitting entries that straddle it.
pub fn clear(
  list: &[TemporarySchedule],
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Vec<TemporarySchedule> {
  let mut result: Vec<TemporarySchedule> = list
    .iter()
    .flat_map(|temp| {
      if !temp.intersects(start, end) {
        return vec![temp.clone()];
      }
      let left = (temp.start < start).then(|| temp.trim_end(start)).flatten();
      let right = (temp.end > end).then(|| temp.trim_start(end)).flatten();
      left.into_iter().chain(right).collect()
    })
    .collect();
  result.sort_by_key(|t| t.start);
  result
}

/// Reduce `list` to its minimal form for presentation.
///
/// Entries that touch (one ends where the next starts) or overlap are
/// coalesced into one spanning both. Within each resulting entry, shifts for
/// the same user that touch or overlap are joined, so the result never holds
/// a same-user overlap. Shifts come out ordered by start time.
pub fn merge(list: &[TemporarySchedule]) -> Vec<TemporarySchedule> {
  let mut sorted = list.to_vec();
  sorted.sort_by_key(|t| t.start);

  let mut merged: Vec<TemporarySchedule> = Vec::with_capacity(sorted.len());
  for temp in sorted {
    if let Some(last) = merged.last_mut()
      && temp.start <= last.end
    {
      last.end = last.end.max(temp.end);
      last.shifts.extend(temp.shifts);
      continue;
    }
    merged.push(temp);
  }

  merged
    .into_iter()
    .map(|temp| TemporarySchedule { shifts: merge_shifts(temp.shifts), ..temp })
    .collect()
}

/// Join touching or overlapping shifts of the same user.
fn merge_shifts(shifts: Vec<Shift>) -> Vec<Shift> {
  let mut by_user: BTreeMap<Uuid, Vec<Shift>> = BTreeMap::new();
  for shift in shifts {
    by_user.entry(shift.user_id).or_default().push(shift);
  }

  let mut result = Vec::new();
  for (_, mut user_shifts) in by_user {
    user_shifts.sort_by_key(|s| s.start);
    let mut joined: Vec<Shift> = Vec::with_capacity(user_shifts.len());
    for shift in user_shifts {
      if let Some(last) = joined.last_mut()
        && shift.start <= last.end
      {
        last.end = last.end.max(shift.end);
        continue;
      }
      joined.push(shift);
    }
    result.extend(joined);
  }
  result.sort_by_key(|s| (s.start, s.end));
  result
}

/// Verify the list is sorted and non-overlapping.
pub fn check_canonical(list: &[TemporarySchedule]) -> Result<()> {
  for pair in list.windows(2) {
    if pair[0].start > pair[1].start || pair[0].end > pair[1].start {
      return Err(Error::Overlap(pair[1].start));
    }
  }
  Ok(())
}
