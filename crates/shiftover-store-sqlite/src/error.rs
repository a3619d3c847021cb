//! Error type for `shiftover-store-sqlite`.

use rusqlite::ErrorCode;
use shiftover_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] shiftover_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  /// The write lock could not be acquired within the busy timeout.
  #[error("database busy: {0}")]
  Busy(rusqlite::Error),

  /// The caller stopped waiting; the transaction was not committed.
  #[error("write cancelled before commit")]
  Cancelled,

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    if is_busy(&e) { Self::Busy(e) } else { Self::Sqlite(e) }
  }
}

impl StoreError for Error {
  fn core(&self) -> Option<&shiftover_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }

  fn is_transient(&self) -> bool {
    match self {
      Self::Busy(_) => true,
      Self::Database(tokio_rusqlite::Error::ConnectionClosed) => true,
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => is_busy(e),
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn is_busy(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

pub(crate) fn is_primary_key_conflict(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}
