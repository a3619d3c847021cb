//! [`DocumentRows`] over a connection that is inside a write transaction.

use rusqlite::OptionalExtension as _;
use shiftover_core::apply::{DocumentRows, InsertOutcome};
use uuid::Uuid;

use crate::{Error, Result, encode::encode_uuid, error::is_primary_key_conflict};

pub(crate) struct SqlRows<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> SqlRows<'a> {
  pub fn new(conn: &'a rusqlite::Connection) -> Self { Self { conn } }
}

/// Read the stored document for `key`, if its row exists.
pub(crate) fn select_data(conn: &rusqlite::Connection, key: Uuid) -> Result<Option<String>> {
  Ok(
    conn
      .query_row(
        "SELECT data FROM schedule_data WHERE schedule_id = ?1",
        rusqlite::params![encode_uuid(key)],
        |row| row.get(0),
      )
      .optional()?,
  )
}

impl DocumentRows for SqlRows<'_> {
  type Error = Error;

  // The enclosing IMMEDIATE transaction already holds the write lock, so a
  // plain read is a locked read.
  fn lock_read(&mut self, key: Uuid) -> Result<Option<String>> {
    select_data(self.conn, key)
  }

  fn insert_default(&mut self, key: Uuid) -> Result<InsertOutcome> {
    match self.conn.execute(
      "INSERT INTO schedule_data (schedule_id) VALUES (?1)",
      rusqlite::params![encode_uuid(key)],
    ) {
      Ok(_) => Ok(InsertOutcome::Inserted),
      Err(e) if is_primary_key_conflict(&e) => Ok(InsertOutcome::Conflict),
      Err(e) => Err(e.into()),
    }
  }

  fn write(&mut self, key: Uuid, data: &str) -> Result<()> {
    let updated = self.conn.execute(
      "UPDATE schedule_data SET data = ?2 WHERE schedule_id = ?1",
      rusqlite::params![encode_uuid(key), data],
    )?;
    if updated == 0 {
      return Err(shiftover_core::Error::MissingRow(key).into());
    }
    Ok(())
  }
}
