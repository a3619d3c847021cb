//! Core types and operations for temporary schedule overrides.
//!
//! A temporary schedule is a window of time with an explicit set of shifts
//! that replaces the normal rotation for that window. This crate owns the
//! canonical interval set, its validation, and the locked read-modify-write
//! protocol used to persist it. It is free of HTTP and database dependencies;
//! storage backends implement the traits in [`store`] and [`apply`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod apply;
pub mod document;
pub mod error;
pub mod filter;
pub mod interval;
pub mod schedule;
pub mod service;
pub mod store;
pub mod time;
pub mod validate;

pub use error::{Error, FieldError, Result, StoreError, ValidationErrors};
