//! Handlers for `/checkins`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use practicum_core::{
  checkin::{CheckIn, CheckInStatus},
  geofence::CheckInClaim,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::Actor,
  error::ApiError,
  handlers::{JsonBody, StudentParams},
};

/// `POST /checkins`, body: `{"location":{"latitude":…,"longitude":…}}` or a
/// manual claim with `reason` / `photo_ref`.
pub async fn record<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  JsonBody(claim): JsonBody<CheckInClaim>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
{
  let checkin = state.portal.record_checkin(&actor, claim).await?;
  Ok((StatusCode::CREATED, Json(checkin)))
}

/// `GET /checkins[?student_id=<id>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Query(params): Query<StudentParams>,
) -> Result<Json<Vec<CheckIn>>, ApiError>
where
  S: Backend,
{
  Ok(Json(state.portal.list_checkins(&actor, params.student_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:   CheckInStatus,
  pub comments: Option<String>,
}

/// `PATCH /checkins/{id}/status`
pub async fn review<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<ReviewBody>,
) -> Result<Json<CheckIn>, ApiError>
where
  S: Backend,
{
  let checkin = state
    .portal
    .review_checkin(&actor, id, body.status, body.comments)
    .await?;
  Ok(Json(checkin))
}
