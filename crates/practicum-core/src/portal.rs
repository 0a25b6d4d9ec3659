//! [`Portal`]: the request-scoped review service.
//!
//! Every operation follows the same path: load what the request targets,
//! resolve the actor's scope, run the guard, run the state machine, then
//! issue a conditional write. Nothing is cached between calls.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  artifact::{
    ArtifactBody, ArtifactFilter, ArtifactKind, ArtifactStatus, NewArtifact,
    StatusChange, WorkItem,
  },
  assignment::{Assignment, NewAssignment},
  capability::{Action, Resource},
  checkin::{CheckIn, CheckInReview, CheckInStatus, NewCheckIn},
  evaluation::{Evaluation, EvaluationInput, EvaluationRecord, UpsertOutcome},
  geofence::{self, CheckInClaim, Geofence},
  guard::{authorize, ensure_capability},
  resolver::resolve_scope,
  store::{IdentityProvider, PortalStore},
  subject::{NewSubject, ReviewerRole, Role, Subject, SubjectFilter, SubjectPatch},
  workflow::{self, Decision, Transition},
};

/// Tunables for [`Portal`].
#[derive(Debug, Clone)]
pub struct PortalConfig {
  /// Radius around a registered workplace within which a GPS check-in counts
  /// as on site.
  pub geofence_radius_m: f64,
}

impl Default for PortalConfig {
  fn default() -> Self { Self { geofence_radius_m: 200.0 } }
}

/// The review workflow and authorization engine over a store `S`.
///
/// The store handle is created once at startup and shared.
pub struct Portal<S> {
  store:  Arc<S>,
  config: PortalConfig,
}

impl<S> Portal<S> {
  pub fn new(store: Arc<S>, config: PortalConfig) -> Self { Self { store, config } }

  pub fn store(&self) -> &Arc<S> { &self.store }
}

impl<S> Portal<S>
where
  S: PortalStore + IdentityProvider,
{
  /// Resolve a bearer-token hash to the subject it was issued to.
  pub async fn authenticate(&self, token_hash: &str) -> Result<Subject> {
    let subject_id = self
      .store
      .resolve_token(token_hash)
      .await
      .map_err(Error::unavailable)?
      .ok_or(Error::Unauthenticated)?;
    self
      .store
      .get_subject(subject_id)
      .await
      .map_err(Error::unavailable)?
      .ok_or(Error::Unauthenticated)
  }
}

impl<S> Portal<S>
where
  S: PortalStore,
{
  // ── Directory ─────────────────────────────────────────────────────────────

  pub async fn register_subject(&self, actor: &Subject, input: NewSubject) -> Result<Subject> {
    ensure_capability(actor, Action::Administer, Resource::Directory)?;
    if input.name.trim().is_empty() {
      return Err(Error::Validation("name must not be empty".into()));
    }
    let subject = self
      .store
      .add_subject(input)
      .await
      .map_err(Error::unavailable)?;
    tracing::info!(
      admin = %actor.subject_id,
      subject = %subject.subject_id,
      role = %subject.role,
      "registered subject"
    );
    Ok(subject)
  }

  pub async fn list_subjects(&self, actor: &Subject, filter: &SubjectFilter) -> Result<Vec<Subject>> {
    ensure_capability(actor, Action::Administer, Resource::Directory)?;
    self
      .store
      .list_subjects(filter)
      .await
      .map_err(Error::unavailable)
  }

  /// Soft role/status change; subjects are never deleted.
  pub async fn update_subject(
    &self,
    actor: &Subject,
    id: Uuid,
    patch: SubjectPatch,
  ) -> Result<Subject> {
    ensure_capability(actor, Action::Administer, Resource::Directory)?;
    if patch.is_empty() {
      return Err(Error::Validation("nothing to update".into()));
    }
    let subject = self
      .store
      .update_subject(id, patch)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound("subject".into()))?;
    tracing::info!(
      admin = %actor.subject_id,
      subject = %id,
      role = %subject.role,
      status = %subject.status,
      "updated subject"
    );
    Ok(subject)
  }

  pub async fn add_assignment(&self, actor: &Subject, input: NewAssignment) -> Result<Assignment> {
    ensure_capability(actor, Action::Administer, Resource::Directory)?;

    let student = self.subject(input.student_id).await?;
    if student.role != Role::Student {
      return Err(Error::Validation(format!(
        "{} is a {}, not a student",
        student.subject_id, student.role
      )));
    }
    let reviewer = self.subject(input.reviewer_id).await?;
    if reviewer.role != Role::from(input.reviewer_role) {
      return Err(Error::Validation(format!(
        "{} is a {}, not a {}",
        reviewer.subject_id, reviewer.role, input.reviewer_role
      )));
    }

    let role = input.reviewer_role;
    let assignment = self
      .store
      .add_assignment(input)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| {
        Error::Conflict(format!(
          "student {} already has an active {role} assignment",
          student.subject_id
        ))
      })?;
    tracing::info!(
      student = %assignment.student_id,
      reviewer = %assignment.reviewer_id,
      role = %assignment.reviewer_role,
      "assignment added"
    );
    Ok(assignment)
  }

  pub async fn deactivate_assignment(&self, actor: &Subject, id: Uuid) -> Result<Assignment> {
    ensure_capability(actor, Action::Administer, Resource::Directory)?;
    let assignment = self
      .store
      .deactivate_assignment(id)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound("assignment".into()))?;
    tracing::info!(assignment = %id, "assignment deactivated");
    Ok(assignment)
  }

  async fn subject(&self, id: Uuid) -> Result<Subject> {
    self
      .store
      .get_subject(id)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound(format!("subject {id}")))
  }

  // ── Artifacts ─────────────────────────────────────────────────────────────

  /// Create a task, report or placement owned by `actor`.
  pub async fn create_artifact(&self, actor: &Subject, body: ArtifactBody) -> Result<WorkItem> {
    let kind = body.kind();
    ensure_capability(actor, Action::Create, Resource::Artifact(kind))?;
    body.validate()?;

    let item = self
      .store
      .create_artifact(NewArtifact {
        student_id: actor.subject_id,
        status: workflow::initial_status(kind),
        body,
      })
      .await
      .map_err(Error::unavailable)?;
    tracing::info!(%kind, artifact = %item.artifact_id, student = %actor.subject_id, "artifact created");
    Ok(item)
  }

  pub async fn get_artifact(&self, actor: &Subject, kind: ArtifactKind, id: Uuid) -> Result<WorkItem> {
    self.load_authorized(actor, Action::Read, kind, id).await
  }

  /// Artifacts of `kind` visible to `actor`, optionally restricted to one
  /// status.
  pub async fn list_artifacts(
    &self,
    actor: &Subject,
    kind: ArtifactKind,
    status: Option<ArtifactStatus>,
  ) -> Result<Vec<WorkItem>> {
    ensure_capability(actor, Action::Read, Resource::Artifact(kind))?;
    let scope = resolve_scope(self.store.as_ref(), actor).await?;
    if scope.is_empty() {
      return Ok(Vec::new());
    }
    let filter = ArtifactFilter { student_ids: scope.student_ids(), status };
    self
      .store
      .list_artifacts(kind, &filter)
      .await
      .map_err(Error::unavailable)
  }

  /// Replace the body of an open artifact. Owner only.
  pub async fn update_artifact(
    &self,
    actor: &Subject,
    kind: ArtifactKind,
    id: Uuid,
    body: ArtifactBody,
  ) -> Result<WorkItem> {
    let item = self.load_authorized(actor, Action::Update, kind, id).await?;
    workflow::next_status(kind, item.status, Transition::Edit)?;
    if body.kind() != kind {
      return Err(Error::Validation(format!(
        "cannot replace a {kind} with a {}",
        body.kind()
      )));
    }
    body.validate()?;

    self
      .store
      .update_artifact_body(id, item.status, body)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| lost_race(kind, id))
  }

  /// Delete an open artifact. Owner only.
  pub async fn delete_artifact(&self, actor: &Subject, kind: ArtifactKind, id: Uuid) -> Result<()> {
    let item = self.load_authorized(actor, Action::Delete, kind, id).await?;
    workflow::next_status(kind, item.status, Transition::Delete)?;

    let deleted = self
      .store
      .delete_artifact(kind, id, item.status)
      .await
      .map_err(Error::unavailable)?;
    if !deleted {
      return Err(lost_race(kind, id));
    }
    tracing::info!(%kind, artifact = %id, "artifact deleted");
    Ok(())
  }

  /// Hand a pending task or report over for review.
  pub async fn submit_artifact(&self, actor: &Subject, kind: ArtifactKind, id: Uuid) -> Result<WorkItem> {
    let item = self.load_authorized(actor, Action::Submit, kind, id).await?;
    let next = workflow::next_status(kind, item.status, Transition::Submit)?;
    self.transition(actor, &item, next, None).await
  }

  /// Approve or reject an artifact of a student in the actor's scope.
  pub async fn review_artifact(
    &self,
    actor: &Subject,
    kind: ArtifactKind,
    id: Uuid,
    decision: Decision,
    comments: Option<String>,
  ) -> Result<WorkItem> {
    let item = self.load_authorized(actor, Action::Review, kind, id).await?;
    let next = workflow::next_status(kind, item.status, Transition::Review(decision))?;
    workflow::check_review_comments(kind, decision, comments.as_deref())?;
    let comments = comments
      .map(|c| c.trim().to_owned())
      .filter(|c| !c.is_empty());
    self.transition(actor, &item, next, comments).await
  }

  async fn transition(
    &self,
    actor: &Subject,
    item: &WorkItem,
    next: ArtifactStatus,
    comments: Option<String>,
  ) -> Result<WorkItem> {
    let kind = item.kind();
    let change = StatusChange {
      kind,
      artifact_id: item.artifact_id,
      expected: item.status,
      new_status: next,
      actor_id: actor.subject_id,
      actor_role: actor.role,
      comments,
    };
    let updated = self
      .store
      .update_artifact_status(change)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| lost_race(kind, item.artifact_id))?;
    tracing::info!(
      %kind,
      artifact = %item.artifact_id,
      actor = %actor.subject_id,
      role = %actor.role,
      from = %item.status,
      to = %next,
      "artifact transitioned"
    );
    Ok(updated)
  }

  async fn load_authorized(
    &self,
    actor: &Subject,
    action: Action,
    kind: ArtifactKind,
    id: Uuid,
  ) -> Result<WorkItem> {
    let item = self
      .store
      .get_artifact(kind, id)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound(kind.to_string()))?;
    let scope = resolve_scope(self.store.as_ref(), actor).await?;
    authorize(actor, action, Resource::Artifact(kind), item.student_id, &scope)?;
    Ok(item)
  }

  // ── Evaluations ───────────────────────────────────────────────────────────

  /// Write or replace the actor's scorecard for a student on a date.
  pub async fn submit_evaluation(
    &self,
    actor: &Subject,
    input: EvaluationInput,
  ) -> Result<(Evaluation, UpsertOutcome)> {
    let scope = resolve_scope(self.store.as_ref(), actor).await?;
    authorize(actor, Action::Evaluate, Resource::Evaluation, input.student_id, &scope)?;
    let evaluator_role = ReviewerRole::try_from(actor.role)
      .map_err(|_| Error::AccessDenied(Resource::Evaluation.to_string()))?;
    input.validate()?;

    let record = EvaluationRecord {
      student_id: input.student_id,
      evaluator_id: actor.subject_id,
      evaluator_role,
      date: input.date,
      scores: input.scores,
      overall_comments: input.overall_comments,
    };
    let (evaluation, outcome) = self
      .store
      .upsert_evaluation(record)
      .await
      .map_err(Error::unavailable)?;
    tracing::info!(
      evaluation = %evaluation.evaluation_id,
      student = %evaluation.student_id,
      evaluator = %actor.subject_id,
      ?outcome,
      "evaluation saved"
    );
    Ok((evaluation, outcome))
  }

  pub async fn list_evaluations(&self, actor: &Subject, student_id: Option<Uuid>) -> Result<Vec<Evaluation>> {
    let Some(ids) = self.visible_students(actor, Resource::Evaluation, student_id).await? else {
      return self.store.list_evaluations(None).await.map_err(Error::unavailable);
    };
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    self
      .store
      .list_evaluations(Some(&ids))
      .await
      .map_err(Error::unavailable)
  }

  // ── Check-ins ─────────────────────────────────────────────────────────────

  /// Record a check-in for `actor`, classified against the workplace of the
  /// student's latest approved placement.
  pub async fn record_checkin(&self, actor: &Subject, claim: CheckInClaim) -> Result<CheckIn> {
    ensure_capability(actor, Action::Record, Resource::CheckIn)?;
    let workplace = self.workplace_of(actor.subject_id).await?;
    let verification = geofence::verify(&claim, workplace.as_ref())?;

    let checkin = self
      .store
      .create_checkin(NewCheckIn {
        student_id:       actor.subject_id,
        location:         claim.location,
        gps_verified:     verification.gps_verified,
        outside_geofence: verification.outside_geofence,
        manual_reason:    non_blank(claim.reason),
        photo_ref:        non_blank(claim.photo_ref),
      })
      .await
      .map_err(Error::unavailable)?;
    if checkin.outside_geofence {
      tracing::warn!(checkin = %checkin.checkin_id, student = %actor.subject_id, "check-in outside geofence");
    } else {
      tracing::info!(checkin = %checkin.checkin_id, student = %actor.subject_id, gps = checkin.gps_verified, "check-in recorded");
    }
    Ok(checkin)
  }

  /// Supervisor verdict on a pending check-in.
  pub async fn review_checkin(
    &self,
    actor: &Subject,
    id: Uuid,
    status: CheckInStatus,
    comments: Option<String>,
  ) -> Result<CheckIn> {
    if status == CheckInStatus::Pending {
      return Err(Error::Validation("status must be VERIFIED or FLAGGED".into()));
    }
    let checkin = self
      .store
      .get_checkin(id)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound(Resource::CheckIn.to_string()))?;
    let scope = resolve_scope(self.store.as_ref(), actor).await?;
    authorize(actor, Action::Verify, Resource::CheckIn, checkin.student_id, &scope)?;

    if checkin.supervisor_status != CheckInStatus::Pending {
      return Err(Error::InvalidStateTransition {
        item:   "check-in",
        status: checkin.supervisor_status.to_string(),
      });
    }

    let updated = self
      .store
      .update_checkin_status(CheckInReview {
        checkin_id: id,
        expected:   CheckInStatus::Pending,
        new_status: status,
        comments:   non_blank(comments),
      })
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::Conflict(format!("check-in {id} was changed by another request")))?;
    tracing::info!(checkin = %id, supervisor = %actor.subject_id, %status, "check-in reviewed");
    Ok(updated)
  }

  pub async fn list_checkins(&self, actor: &Subject, student_id: Option<Uuid>) -> Result<Vec<CheckIn>> {
    let Some(ids) = self.visible_students(actor, Resource::CheckIn, student_id).await? else {
      return self.store.list_checkins(None).await.map_err(Error::unavailable);
    };
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    self
      .store
      .list_checkins(Some(&ids))
      .await
      .map_err(Error::unavailable)
  }

  async fn workplace_of(&self, student_id: Uuid) -> Result<Option<Geofence>> {
    let filter = ArtifactFilter {
      student_ids: Some(vec![student_id]),
      status:      Some(ArtifactStatus::Approved),
    };
    let placements = self
      .store
      .list_artifacts(ArtifactKind::Placement, &filter)
      .await
      .map_err(Error::unavailable)?;
    Ok(placements.iter().find_map(|p| match &p.body {
      ArtifactBody::Placement(body) => body.workplace().map(|center| Geofence {
        center,
        radius_m: self.config.geofence_radius_m,
      }),
      _ => None,
    }))
  }

  /// Owner filter for a read listing: `None` = everyone, otherwise the
  /// students the actor may see (narrowed to `student_id` when given).
  async fn visible_students(
    &self,
    actor: &Subject,
    resource: Resource,
    student_id: Option<Uuid>,
  ) -> Result<Option<Vec<Uuid>>> {
    ensure_capability(actor, Action::Read, resource)?;
    let scope = resolve_scope(self.store.as_ref(), actor).await?;
    match student_id {
      Some(id) => {
        authorize(actor, Action::Read, resource, id, &scope)?;
        Ok(Some(vec![id]))
      }
      None => Ok(scope.student_ids()),
    }
  }
}

fn lost_race(kind: ArtifactKind, id: Uuid) -> Error {
  tracing::warn!(%kind, artifact = %id, "conditional write matched no row");
  Error::Conflict(format!("{kind} {id} was changed by another request"))
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
