//! Error types for `shiftover-core`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  /// Stored document bytes could not be decoded. Never retried.
  #[error("corrupt schedule data: {0}")]
  Decode(#[source] serde_json::Error),

  #[error("failed to encode schedule data: {0}")]
  Encode(#[source] serde_json::Error),

  /// The row was still absent after it was inserted (or after losing the
  /// insert race to another writer).
  #[error("schedule data row for {0} missing after insert")]
  MissingRow(Uuid),

  #[error("temporary schedules overlap at {0}")]
  Overlap(DateTime<Utc>),
}

impl Error {
  pub fn validation(&self) -> Option<&ValidationErrors> {
    match self {
      Self::Validation(v) => Some(v),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Validation ──────────────────────────────────────────────────────────────

/// A single rule violation, scoped to the input field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:  String,
  pub reason: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self { field: field.into(), reason: reason.into() }
  }
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.reason)
  }
}

/// Every violation found in one submission. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  /// `Ok(())` if `errors` is empty, otherwise all of them as one error.
  pub fn check(errors: Vec<FieldError>) -> Result<(), Self> {
    if errors.is_empty() { Ok(()) } else { Err(Self(errors)) }
  }

  pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self(vec![FieldError::new(field, reason)])
  }

  pub fn errors(&self) -> &[FieldError] { &self.0 }

  pub fn has_field(&self, field: &str) -> bool {
    self.0.iter().any(|e| e.field == field)
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{e}")?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Backend errors ──────────────────────────────────────────────────────────

/// Implemented by storage backend error types so outer layers can classify
/// failures without knowing the backend.
pub trait StoreError: std::error::Error + From<Error> + Send + Sync + 'static {
  /// The core error wrapped by this one, if any.
  fn core(&self) -> Option<&Error>;

  /// `true` for lock-wait timeouts and connection failures: the operation did
  /// not land and may be retried by the caller.
  fn is_transient(&self) -> bool;
}
