//! SQL schema for the shiftover SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One JSON document per schedule, created on first write and never deleted.
CREATE TABLE IF NOT EXISTS schedule_data (
    schedule_id TEXT PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT ''
);

-- Owned by the user system; read here only to hide shifts of deleted users.
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    name    TEXT NOT NULL
);

PRAGMA user_version = 1;
";
