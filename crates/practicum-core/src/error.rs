//! Error types for `practicum-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or malformed.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("authentication required")]
  Unauthenticated,

  /// Role or relationship check failed. The message deliberately matches
  /// [`Error::NotFound`] so callers cannot probe for existence.
  #[error("{0} not found or access denied")]
  AccessDenied(String),

  #[error("{0} not found or access denied")]
  NotFound(String),

  #[error("{item} is already in {status} status")]
  InvalidStateTransition { item: &'static str, status: String },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("head of department {0} has no department assigned")]
  DepartmentNotFound(Uuid),

  #[error("dependency unavailable: {0}")]
  DependencyUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a store or identity-provider failure.
  pub fn unavailable<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::DependencyUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
