//! [`SqliteStore`], the SQLite implementation of [`ScheduleStore`].

use std::{
  collections::HashSet,
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use shiftover_core::{
  apply::apply,
  document::Document,
  schedule::TemporarySchedule,
  service::{clear_mutation, prepare_clear, prepare_set, set_mutation},
  store::{ScheduleStore, UserDirectory},
};

use crate::{
  Error, Result,
  encode::{decode_uuid, encode_uuid},
  error::is_busy,
  rows::{SqlRows, select_data},
  schema::SCHEMA,
};

/// How long a writer waits for the lock before failing with
/// [`Error::Busy`](crate::Error::Busy).
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL_MIN: Duration = Duration::from_millis(2);
const LOCK_POLL_MAX: Duration = Duration::from_millis(50);

// ─── Store ───────────────────────────────────────────────────────────────────

/// Temporary schedule storage backed by a single SQLite file.
///
/// Writes go through one connection, reads through another, so a reader never
/// queues behind a writer waiting on the lock. Cloning is cheap; the inner
/// connections are reference-counted.
///
/// The writer connection never blocks inside SQLite waiting for the lock.
/// [`transaction`](Self::transaction) polls for it instead, so dropping the
/// returned future abandons the wait and nothing is written.
#[derive(Clone)]
pub struct SqliteStore {
  writer:       tokio_rusqlite::Connection,
  reader:       tokio_rusqlite::Connection,
  busy_timeout: Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
    let path = path.as_ref();
    let writer = tokio_rusqlite::Connection::open(path).await?;
    init_connection(&writer, busy_timeout, Some(SCHEMA)).await?;
    let reader = tokio_rusqlite::Connection::open(path).await?;
    init_connection(&reader, busy_timeout, None).await?;
    tracing::debug!(?path, ?busy_timeout, "opened schedule store");
    Ok(Self { writer, reader, busy_timeout })
  }

  /// Open an in-memory store for testing. Reads and writes share
  /// the one connection.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    init_connection(&conn, DEFAULT_BUSY_TIMEOUT, Some(SCHEMA)).await?;
    Ok(Self {
      writer:       conn.clone(),
      reader:       conn,
      busy_timeout: DEFAULT_BUSY_TIMEOUT,
    })
  }

  /// Run `f` in one IMMEDIATE transaction on the writer connection, committing
  /// only if it returns `Ok`.
  ///
  /// This is how callers compose schedule writes with their own statements
  /// (through [`ScheduleTx::connection`]) atomically. Waiting for the write
  /// lock gives up with [`Error::Busy`] after the busy timeout. If the future
  /// is dropped first, no further attempt is made and a transaction already
  /// under way rolls back instead of committing.
  pub async fn transaction<T, F>(&self, mut f: F) -> Result<T>
  where
    F: FnOnce(&ScheduleTx<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let cancelled = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(cancelled.clone());
    let deadline = tokio::time::Instant::now() + self.busy_timeout;
    let mut poll = LOCK_POLL_MIN;

    loop {
      let flag = cancelled.clone();
      let attempt = self
        .writer
        .call(move |conn| Ok(run_immediate(conn, &flag, f)))
        .await?;
      match attempt {
        Attempt::Done(result) => return result,
        Attempt::Busy(returned, err) => {
          if tokio::time::Instant::now() >= deadline {
            return Err(Error::Busy(err));
          }
          f = returned;
          tokio::time::sleep(poll).await;
          poll = (poll * 2).min(LOCK_POLL_MAX);
        }
      }
    }
  }

  /// Record that a user exists. Owned by the user system; exposed for it and
  /// for tests.
  pub async fn add_user(&self, id: Uuid, name: impl Into<String>) -> Result<()> {
    let id_str = encode_uuid(id);
    let name = name.into();
    self
      .transaction(move |tx| {
        tx.connection().execute(
          "INSERT INTO users (user_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await
  }

  /// Delete a user. Shifts referencing it stay stored but stop being listed.
  pub async fn remove_user(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .transaction(move |tx| {
        tx.connection()
          .execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])?;
        Ok(())
      })
      .await
  }

  /// The stored bytes for `key`, unfiltered and undecoded.
  pub(crate) async fn raw_document(&self, key: Uuid) -> Result<Option<String>> {
    self.reader.call(move |conn| Ok(select_data(conn, key))).await?
  }
}

async fn init_connection(
  conn: &tokio_rusqlite::Connection,
  busy_timeout: Duration,
  schema: Option<&'static str>,
) -> Result<()> {
  conn
    .call(move |conn| {
      conn.busy_timeout(busy_timeout)?;
      if let Some(schema) = schema {
        conn.execute_batch(schema)?;
        // Writers wait for the lock in `SqliteStore::transaction`.
        conn.busy_timeout(Duration::ZERO)?;
      }
      Ok(())
    })
    .await?;
  Ok(())
}

/// Set when the future driving a transaction is dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
  fn drop(&mut self) { self.0.store(true, Ordering::Release); }
}

enum Attempt<T, F> {
  Done(Result<T>),
  /// The write lock is held elsewhere; `f` is handed back for the next try.
  Busy(F, rusqlite::Error),
}

fn run_immediate<T, F>(conn: &mut rusqlite::Connection, cancelled: &AtomicBool, f: F) -> Attempt<T, F>
where
  F: FnOnce(&ScheduleTx<'_>) -> Result<T>,
{
  if cancelled.load(Ordering::Acquire) {
    return Attempt::Done(Err(Error::Cancelled));
  }
  match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
    Ok(tx) => Attempt::Done(finish(tx, cancelled, f)),
    Err(e) if is_busy(&e) => Attempt::Busy(f, e),
    Err(e) => Attempt::Done(Err(e.into())),
  }
}

fn finish<T>(
  tx: rusqlite::Transaction<'_>,
  cancelled: &AtomicBool,
  f: impl FnOnce(&ScheduleTx<'_>) -> Result<T>,
) -> Result<T> {
  // Dropping `tx` on any early return rolls it back.
  let value = f(&ScheduleTx::new(&tx))?;
  if cancelled.load(Ordering::Acquire) {
    tracing::debug!("caller went away before commit; rolling back");
    return Err(Error::Cancelled);
  }
  tx.commit()?;
  Ok(value)
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// Schedule operations bound to an open transaction.
///
/// Obtained from [`SqliteStore::transaction`], or built over a caller's own
/// transaction with [`ScheduleTx::new`]; that transaction should be begun
/// with [`TransactionBehavior::Immediate`] so the write lock is held from the
/// first read. Nothing here commits.
pub struct ScheduleTx<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> ScheduleTx<'a> {
  pub fn new(tx: &'a rusqlite::Transaction<'_>) -> Self { Self { conn: tx } }

  /// The underlying transaction, for sibling writes in the same atomic unit.
  pub fn connection(&self) -> &rusqlite::Connection { self.conn }

  /// Current document for `key` as seen by this transaction.
  pub fn load(&self, key: Uuid) -> Result<Document> {
    let raw = select_data(self.conn, key)?.unwrap_or_default();
    Ok(Document::decode(&raw)?)
  }

  /// See [`shiftover_core::apply::apply`].
  pub fn apply<F>(&self, key: Uuid, mutate: F) -> Result<()>
  where
    F: FnOnce(Document) -> shiftover_core::Result<Document>,
  {
    apply(&mut SqlRows::new(self.conn), key, mutate)
  }

  pub fn set_temporary_schedule(&self, key: Uuid, temp: &TemporarySchedule) -> Result<()> {
    let temp = prepare_set(temp, Utc::now())?;
    self.apply(key, set_mutation(temp))
  }

  pub fn clear_temporary_schedules(
    &self,
    key: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<()> {
    let (start, end) = prepare_clear(start, end, Utc::now())?;
    self.apply(key, clear_mutation(start, end))
  }
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl ScheduleStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self, key: Uuid) -> Result<Document> {
    let raw = self.raw_document(key).await?.unwrap_or_default();
    Ok(Document::decode(&raw)?)
  }

  async fn apply<F>(&self, key: Uuid, mutate: F) -> Result<()>
  where
    F: FnOnce(Document) -> shiftover_core::Result<Document> + Send + 'static,
  {
    self.transaction(move |tx| tx.apply(key, mutate)).await
  }
}

impl UserDirectory for SqliteStore {
  type Error = crate::Error;

  async fn existing_users(&self, ids: Vec<Uuid>) -> Result<HashSet<Uuid>> {
    let found: Vec<String> = self
      .reader
      .call(move |conn| {
        let mut stmt = conn.prepare_cached("SELECT user_id FROM users WHERE user_id = ?1")?;
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
          let row: Option<String> = stmt
            .query_row(rusqlite::params![encode_uuid(id)], |row| row.get(0))
            .optional()?;
          found.extend(row);
        }
        Ok(found)
      })
      .await?;

    found.iter().map(|s| decode_uuid(s)).collect()
  }
}
