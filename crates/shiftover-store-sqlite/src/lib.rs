//! SQLite backend for shiftover temporary schedules.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Writers take SQLite's write lock with
//! `BEGIN IMMEDIATE`; readers run against the last committed WAL snapshot and
//! never wait on it.

mod encode;
mod rows;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{ScheduleTx, SqliteStore};
