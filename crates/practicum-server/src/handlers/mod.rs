pub mod artifacts;
pub mod checkins;
pub mod directory;
pub mod evaluations;

use axum::extract::FromRequest;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `axum::Json` whose rejections become a 400 with the usual error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `?student_id=` narrowing shared by the evaluation and check-in listings.
#[derive(Debug, Default, Deserialize)]
pub struct StudentParams {
  pub student_id: Option<Uuid>,
}
