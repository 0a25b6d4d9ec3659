//! Handlers for `/evaluations`.
//!
//! `PUT` is an upsert keyed by `(student, evaluator, date)`: 201 when the
//! scorecard is new, 200 when it replaced an earlier one.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use practicum_core::evaluation::{Evaluation, EvaluationInput, UpsertOutcome};

use crate::{
  AppState, Backend,
  auth::Actor,
  error::ApiError,
  handlers::{JsonBody, StudentParams},
};

/// `PUT /evaluations`
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  JsonBody(input): JsonBody<EvaluationInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
{
  let (evaluation, outcome) = state.portal.submit_evaluation(&actor, input).await?;
  let status = match outcome {
    UpsertOutcome::Created => StatusCode::CREATED,
    UpsertOutcome::Updated => StatusCode::OK,
  };
  Ok((status, Json(evaluation)))
}

/// `GET /evaluations[?student_id=<id>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Query(params): Query<StudentParams>,
) -> Result<Json<Vec<Evaluation>>, ApiError>
where
  S: Backend,
{
  Ok(Json(state.portal.list_evaluations(&actor, params.student_id).await?))
}
