//! The versioned per-schedule document and its field-preserving encoding.
//!
//! Stored shape:
//!
//! ```json
//! { "V1": { "temporarySchedules": [ ... ] } }
//! ```
//!
//! Members this version does not recognise, at the top level or inside `V1`,
//! are kept in `unknown` on decode. On write the new document is overlaid onto
//! the original stored JSON, so a member is only ever replaced by a member the
//! current schema knows about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{Error, Result, schedule::TemporarySchedule};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
  #[serde(rename = "V1", default)]
  pub v1:      DocumentV1,
  #[serde(flatten)]
  pub unknown: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentV1 {
  #[serde(rename = "temporarySchedules", default)]
  pub temporary_schedules: Vec<TemporarySchedule>,
  #[serde(flatten)]
  pub unknown:             Map<String, Value>,
}

impl Document {
  /// Decode stored bytes. Empty input is the empty document.
  pub fn decode(raw: &str) -> Result<Self> {
    if raw.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_json::from_str(raw).map_err(Error::Decode)
  }

  /// Encode `self` over `original`, keeping every member of `original` that
  /// this document does not itself own.
  ///
  /// Only `V1.temporarySchedules` is written over the stored JSON. Unknown
  /// members are taken from `original` as stored, and from `self` only when
  /// `original` lacks them.
  pub fn encode_preserving(&self, original: &str) -> Result<String> {
    let mut base = if original.trim().is_empty() {
      Value::Object(Map::new())
    } else {
      serde_json::from_str(original).map_err(Error::Decode)?
    };
    let schedules = serde_json::to_value(&self.v1.temporary_schedules).map_err(Error::Encode)?;
    let carried = serde_json::to_value(self).map_err(Error::Encode)?;
    fill_missing(&mut base, carried);
    overlay(&mut base, json!({ "V1": { "temporarySchedules": schedules } }));
    serde_json::to_string(&base).map_err(Error::Encode)
  }

  pub fn temporary_schedules(&self) -> &[TemporarySchedule] {
    &self.v1.temporary_schedules
  }

  pub fn with_temporary_schedules(self, temporary_schedules: Vec<TemporarySchedule>) -> Self {
    Self {
      v1: DocumentV1 { temporary_schedules, ..self.v1 },
      ..self
    }
  }
}

/// Recursively add the members of `extra` that `base` does not have. Where
/// both have a member, `base` wins unless both are objects.
fn fill_missing(base: &mut Value, extra: Value) {
  if let (Value::Object(base), Value::Object(extra)) = (base, extra) {
    for (key, value) in extra {
      match base.get_mut(&key) {
        Some(existing) => fill_missing(existing, value),
        None => {
          base.insert(key, value);
        }
      }
    }
  }
}

/// Recursively write `update` into `base`. Objects merge member-wise; any
/// other value (arrays included) replaces what was there.
fn overlay(base: &mut Value, update: Value) {
  match (base, update) {
    (Value::Object(base), Value::Object(update)) => {
      for (key, value) in update {
        match base.get_mut(&key) {
          Some(existing) if existing.is_object() && value.is_object() => {
            overlay(existing, value)
          }
          _ => {
            base.insert(key, value);
          }
        }
      }
    }
    (base, update) => *base = update,
  }
}
