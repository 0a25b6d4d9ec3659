//! Handlers for the caller's own profile and the admin-only directory.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/me` | The authenticated subject |
//! | `GET`    | `/subjects` | Optional `?role=` and `?department_id=` |
//! | `POST`   | `/subjects` | Body: [`NewSubject`]; 201 |
//! | `PATCH`  | `/subjects/{id}` | Body: `{"role":…,"status":…}` |
//! | `POST`   | `/assignments` | Body: [`NewAssignment`]; 201, 409 if taken |
//! | `DELETE` | `/assignments/{id}` | Deactivates; 204 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use practicum_core::{
  assignment::NewAssignment,
  subject::{NewSubject, Subject, SubjectFilter, SubjectPatch},
};
use uuid::Uuid;

use crate::{AppState, Backend, auth::Actor, error::ApiError, handlers::JsonBody};

/// `GET /me`
pub async fn me(Actor(actor): Actor) -> Json<Subject> { Json(actor) }

// ─── Subjects ─────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list_subjects<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Query(filter): Query<SubjectFilter>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: Backend,
{
  Ok(Json(state.portal.list_subjects(&actor, &filter).await?))
}

/// `POST /subjects`
pub async fn create_subject<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  JsonBody(input): JsonBody<NewSubject>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
{
  let subject = state.portal.register_subject(&actor, input).await?;
  Ok((StatusCode::CREATED, Json(subject)))
}

/// `PATCH /subjects/{id}`
pub async fn update_subject<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  JsonBody(patch): JsonBody<SubjectPatch>,
) -> Result<Json<Subject>, ApiError>
where
  S: Backend,
{
  Ok(Json(state.portal.update_subject(&actor, id, patch).await?))
}

// ─── Assignments ──────────────────────────────────────────────────────────────

/// `POST /assignments`
pub async fn create_assignment<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  JsonBody(input): JsonBody<NewAssignment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
{
  let assignment = state.portal.add_assignment(&actor, input).await?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

/// `DELETE /assignments/{id}`
pub async fn deactivate_assignment<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
{
  state.portal.deactivate_assignment(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
