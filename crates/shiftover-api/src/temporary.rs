//! Handlers for `/schedules/:id/temporary-schedules` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/schedules/:id/temporary-schedules` | Canonical list |
//! | `PUT`  | `/schedules/:id/temporary-schedules` | Body: [`TemporarySchedule`]; 204 |
//! | `POST` | `/schedules/:id/temporary-schedules/clear` | Body: `{"start":…,"end":…}`; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shiftover_core::{
  schedule::TemporarySchedule,
  service,
  store::{ScheduleStore, UserDirectory},
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /schedules/:id/temporary-schedules`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<TemporarySchedule>>, ApiError>
where
  S: ScheduleStore + UserDirectory,
  <S as ScheduleStore>::Error: From<<S as UserDirectory>::Error>,
{
  let list = service::list_temporary_schedules(&*store, &*store, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `PUT /schedules/:id/temporary-schedules`
pub async fn set<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TemporarySchedule>,
) -> Result<StatusCode, ApiError>
where
  S: ScheduleStore + UserDirectory,
  <S as ScheduleStore>::Error: From<<S as UserDirectory>::Error>,
{
  service::set_temporary_schedule(&*store, id, &body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ClearBody {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

/// `POST /schedules/:id/temporary-schedules/clear`
pub async fn clear<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ClearBody>,
) -> Result<StatusCode, ApiError>
where
  S: ScheduleStore + UserDirectory,
  <S as ScheduleStore>::Error: From<<S as UserDirectory>::Error>,
{
  service::clear_temporary_schedules(&*store, id, body.start, body.end)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
