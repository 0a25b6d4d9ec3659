//! Handlers for `/artifacts/{kind}` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/artifacts/{kind}` | Body: kind-specific payload; 201 |
//! | `GET`    | `/artifacts/{kind}` | Optional `?status=`; scoped to the caller |
//! | `GET`    | `/artifacts/{kind}/{id}` | 404 if absent, 403 if out of scope |
//! | `PUT`    | `/artifacts/{kind}/{id}` | Owner, open status only |
//! | `DELETE` | `/artifacts/{kind}/{id}` | Owner, open status only; 204 |
//! | `POST`   | `/artifacts/{kind}/{id}/submit` | Task/report owner |
//! | `PATCH`  | `/artifacts/{kind}/{id}/status` | Body: `{"status":"APPROVED","comments":"…"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use practicum_core::{
  artifact::{ArtifactBody, ArtifactKind, ArtifactStatus, WorkItem},
  workflow::Decision,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Actor, error::ApiError, handlers::JsonBody};

fn parse_body(kind: ArtifactKind, data: serde_json::Value) -> Result<ArtifactBody, ApiError> {
  ArtifactBody::from_parts(kind, data)
    .map_err(|e| ApiError::BadRequest(format!("invalid {kind} payload: {e}")))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /artifacts/{kind}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(kind): Path<ArtifactKind>,
  JsonBody(data): JsonBody<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
{
  let body = parse_body(kind, data)?;
  let item = state.portal.create_artifact(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ArtifactStatus>,
}

/// `GET /artifacts/{kind}[?status=<status>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(kind): Path<ArtifactKind>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<WorkItem>>, ApiError>
where
  S: Backend,
{
  let items = state.portal.list_artifacts(&actor, kind, params.status).await?;
  Ok(Json(items))
}

// ─── Single item ──────────────────────────────────────────────────────────────

/// `GET /artifacts/{kind}/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path((kind, id)): Path<(ArtifactKind, Uuid)>,
) -> Result<Json<WorkItem>, ApiError>
where
  S: Backend,
{
  Ok(Json(state.portal.get_artifact(&actor, kind, id).await?))
}

/// `PUT /artifacts/{kind}/{id}`: replaces the whole payload.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path((kind, id)): Path<(ArtifactKind, Uuid)>,
  JsonBody(data): JsonBody<serde_json::Value>,
) -> Result<Json<WorkItem>, ApiError>
where
  S: Backend,
{
  let body = parse_body(kind, data)?;
  Ok(Json(state.portal.update_artifact(&actor, kind, id, body).await?))
}

/// `DELETE /artifacts/{kind}/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path((kind, id)): Path<(ArtifactKind, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
{
  state.portal.delete_artifact(&actor, kind, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /artifacts/{kind}/{id}/submit`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path((kind, id)): Path<(ArtifactKind, Uuid)>,
) -> Result<Json<WorkItem>, ApiError>
where
  S: Backend,
{
  Ok(Json(state.portal.submit_artifact(&actor, kind, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:   Decision,
  pub comments: Option<String>,
}

/// `PATCH /artifacts/{kind}/{id}/status`
pub async fn review<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path((kind, id)): Path<(ArtifactKind, Uuid)>,
  JsonBody(body): JsonBody<ReviewBody>,
) -> Result<Json<WorkItem>, ApiError>
where
  S: Backend,
{
  let item = state
    .portal
    .review_artifact(&actor, kind, id, body.status, body.comments)
    .await?;
  Ok(Json(item))
}
