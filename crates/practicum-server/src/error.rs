//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use practicum_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] Error),

  /// The request body does not parse as the payload for its path.
  #[error("bad request: {0}")]
  BadRequest(String),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Unauthenticated => StatusCode::UNAUTHORIZED,
        Error::AccessDenied(_) => StatusCode::FORBIDDEN,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidStateTransition { .. } | Error::Conflict(_) => StatusCode::CONFLICT,
        Error::DepartmentNotFound(_)
        | Error::DependencyUnavailable(_)
        | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn status_of(e: Error) -> StatusCode { ApiError::from(e).into_response().status() }

  #[test]
  fn core_errors_map_to_status_codes() {
    assert_eq!(status_of(Error::Validation("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(Error::AccessDenied("task".into())), StatusCode::FORBIDDEN);
    assert_eq!(status_of(Error::NotFound("task".into())), StatusCode::NOT_FOUND);
    assert_eq!(
      status_of(Error::InvalidStateTransition { item: "task", status: "APPROVED".into() }),
      StatusCode::CONFLICT
    );
    assert_eq!(status_of(Error::Conflict("race".into())), StatusCode::CONFLICT);
    assert_eq!(
      status_of(Error::DepartmentNotFound(Uuid::new_v4())),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn unauthenticated_carries_challenge() {
    let res = ApiError::from(Error::Unauthenticated).into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
  }
}
