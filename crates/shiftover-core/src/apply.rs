//! The locked read-modify-write protocol for a schedule document.
//!
//! Backends expose their row primitives through [`DocumentRows`], which must
//! be bound to an open transaction; [`apply`] drives them. The row for a key
//! is created lazily. When two first writers race, the loser's insert hits the
//! primary key and it re-reads the winner's row instead. That is the only
//! retry.

use uuid::Uuid;

use crate::{Error, Result, document::Document};

/// Result of inserting the default row for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  Inserted,
  /// Another writer created the row first.
  Conflict,
}

/// Row-level primitives of a storage backend, scoped to one transaction.
pub trait DocumentRows {
  type Error: From<Error>;

  /// Read the stored document for `key` while holding the write lock for it.
  /// `None` if no row exists yet.
  fn lock_read(&mut self, key: Uuid) -> Result<Option<String>, Self::Error>;

  /// Insert an empty row for `key`. A primary-key conflict must be reported
  /// as [`InsertOutcome::Conflict`]; any other failure is an error.
  fn insert_default(&mut self, key: Uuid) -> Result<InsertOutcome, Self::Error>;

  /// Replace the stored document for `key`.
  fn write(&mut self, key: Uuid, data: &str) -> Result<(), Self::Error>;
}

/// Where the row acquisition stands after each lock read came back empty.
#[derive(Debug, Clone, Copy)]
enum Acquire {
  /// First read; the row may simply not exist yet.
  Initial,
  /// We inserted the row ourselves.
  Inserted,
  /// Our insert lost to a concurrent first writer.
  Raced,
}

fn acquire<R: DocumentRows>(rows: &mut R, key: Uuid) -> Result<String, R::Error> {
  let mut state = Acquire::Initial;
  loop {
    if let Some(raw) = rows.lock_read(key)? {
      if let Acquire::Raced = state {
        tracing::info!(%key, "lost schedule data insert race; using existing row");
      }
      return Ok(raw);
    }
    state = match state {
      Acquire::Initial => match rows.insert_default(key)? {
        InsertOutcome::Inserted => {
          tracing::debug!(%key, "created schedule data row");
          Acquire::Inserted
        }
        InsertOutcome::Conflict => Acquire::Raced,
      },
      Acquire::Inserted | Acquire::Raced => return Err(Error::MissingRow(key).into()),
    };
  }
}

/// Lock the row for `key` (creating it if needed), run `mutate` over the
/// decoded document, and write the result back preserving unknown fields.
///
/// If `mutate` fails nothing is written. Committing is the caller's job.
pub fn apply<R, F>(rows: &mut R, key: Uuid, mutate: F) -> Result<(), R::Error>
where
  R: DocumentRows,
  F: FnOnce(Document) -> Result<Document>,
{
  let raw = acquire(rows, key)?;
  let doc = Document::decode(&raw)?;
  let updated = mutate(doc)?;
  let data = updated.encode_preserving(&raw)?;
  rows.write(key, &data)
}
