//! JSON REST API for temporary schedules.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`ScheduleStore`] and [`UserDirectory`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", shiftover_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod temporary;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use shiftover_core::store::{ScheduleStore, UserDirectory};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ScheduleStore + UserDirectory + 'static,
  <S as ScheduleStore>::Error: From<<S as UserDirectory>::Error>,
{
  Router::new()
    .route(
      "/schedules/{id}/temporary-schedules",
      get(temporary::list::<S>).put(temporary::set::<S>),
    )
    .route("/schedules/{id}/temporary-schedules/clear", post(temporary::clear::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
