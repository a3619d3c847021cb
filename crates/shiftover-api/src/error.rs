//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use shiftover_core::{StoreError, ValidationErrors};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid request: {0}")]
  Validation(ValidationErrors),

  /// The store could not take the lock in time; the request may be retried.
  #[error("temporarily unavailable: {0}")]
  Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn from_store<E: StoreError>(e: E) -> Self {
    if let Some(v) = e.core().and_then(|c| c.validation()) {
      return ApiError::Validation(v.clone());
    }
    if e.is_transient() {
      tracing::warn!(error = %e, "transient store failure");
      ApiError::Unavailable(Box::new(e))
    } else {
      tracing::error!(error = %e, "store failure");
      ApiError::Store(Box::new(e))
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(v) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": v.to_string(), "fields": v })),
      )
        .into_response(),
      ApiError::Unavailable(e) => (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}
