//! Storage abstractions consumed by the review engine.
//!
//! Implemented by backends (e.g. `practicum-store-sqlite`). Higher layers
//! depend on these traits, not on any concrete backend.
//!
//! Conditional writes take the status the caller last observed and return
//! `None` when no row is in that status any more. That `None` is the only
//! signal a caller gets that it lost a race to a concurrent writer.

use std::future::Future;

use uuid::Uuid;

use crate::{
  artifact::{ArtifactBody, ArtifactFilter, ArtifactKind, ArtifactStatus, NewArtifact, StatusChange, WorkItem},
  assignment::{Assignment, NewAssignment},
  checkin::{CheckIn, CheckInReview, NewCheckIn},
  evaluation::{Evaluation, EvaluationRecord, UpsertOutcome},
  subject::{NewSubject, ReviewerRole, Subject, SubjectFilter, SubjectPatch},
};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Resolves bearer tokens to subjects. Only token hashes cross this boundary.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the subject a token hash was issued to, if any.
  fn resolve_token<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  /// Record a new token hash for `subject_id`.
  fn issue_token(
    &self,
    subject_id: Uuid,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Portal store ────────────────────────────────────────────────────────────

/// Record-level persistence for the directory, assignments and artifacts.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait PortalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create an `Active` subject.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  fn list_subjects<'a>(
    &'a self,
    filter: &'a SubjectFilter,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + 'a;

  /// Apply a role/status change. Returns `None` if the subject is unknown.
  fn update_subject(
    &self,
    id: Uuid,
    patch: SubjectPatch,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  /// Insert an active assignment. Returns `None` if the student already has
  /// an active assignment for the same reviewer role.
  fn add_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  /// Mark an assignment inactive. Returns `None` if it does not exist.
  fn deactivate_assignment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  /// Student ids with an active assignment to `reviewer_id` in `role`.
  fn list_active_assignments(
    &self,
    reviewer_id: Uuid,
    role: ReviewerRole,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Artifacts ─────────────────────────────────────────────────────────

  fn create_artifact(
    &self,
    input: NewArtifact,
  ) -> impl Future<Output = Result<WorkItem, Self::Error>> + Send + '_;

  /// Fetch an artifact of the given kind. An id of another kind is `None`.
  fn get_artifact(
    &self,
    kind: ArtifactKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<WorkItem>, Self::Error>> + Send + '_;

  /// Replace the body while the status is still `expected`.
  fn update_artifact_body(
    &self,
    id: Uuid,
    expected: ArtifactStatus,
    body: ArtifactBody,
  ) -> impl Future<Output = Result<Option<WorkItem>, Self::Error>> + Send + '_;

  /// Compare-and-swap the status, recording the actor and its comments.
  fn update_artifact_status(
    &self,
    change: StatusChange,
  ) -> impl Future<Output = Result<Option<WorkItem>, Self::Error>> + Send + '_;

  /// Delete while the status is still `expected`. Returns whether a row went.
  fn delete_artifact(
    &self,
    kind: ArtifactKind,
    id: Uuid,
    expected: ArtifactStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Artifacts of `kind` matching `filter`, newest first.
  fn list_artifacts<'a>(
    &'a self,
    kind: ArtifactKind,
    filter: &'a ArtifactFilter,
  ) -> impl Future<Output = Result<Vec<WorkItem>, Self::Error>> + Send + 'a;

  // ── Evaluations ───────────────────────────────────────────────────────

  /// Insert or replace the evaluation keyed by
  /// `(student_id, evaluator_id, date)`, scores included, atomically.
  fn upsert_evaluation(
    &self,
    record: EvaluationRecord,
  ) -> impl Future<Output = Result<(Evaluation, UpsertOutcome), Self::Error>> + Send + '_;

  /// Evaluations for the given students (`None` = all), newest first.
  fn list_evaluations<'a>(
    &'a self,
    student_ids: Option<&'a [Uuid]>,
  ) -> impl Future<Output = Result<Vec<Evaluation>, Self::Error>> + Send + 'a;

  // ── Check-ins ─────────────────────────────────────────────────────────

  fn create_checkin(
    &self,
    input: NewCheckIn,
  ) -> impl Future<Output = Result<CheckIn, Self::Error>> + Send + '_;

  fn get_checkin(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CheckIn>, Self::Error>> + Send + '_;

  /// Compare-and-swap the supervisor status.
  fn update_checkin_status(
    &self,
    review: CheckInReview,
  ) -> impl Future<Output = Result<Option<CheckIn>, Self::Error>> + Send + '_;

  /// Check-ins for the given students (`None` = all), newest first.
  fn list_checkins<'a>(
    &'a self,
    student_ids: Option<&'a [Uuid]>,
  ) -> impl Future<Output = Result<Vec<CheckIn>, Self::Error>> + Send + 'a;
}
