//! The authorization guard.
//!
//! A pure decision over the actor, the requested action, the resource's owner
//! and the actor's freshly resolved [`Scope`]. It reads nothing and writes
//! nothing; callers resolve the scope per request and pass it in.

use uuid::Uuid;

use crate::{
  Error, Result,
  capability::{Action, Resource, permits},
  resolver::Scope,
  subject::{Role, Subject},
};

/// Role-level check: the account is active and the role holds the
/// capability. Used on its own for actions without an owner (listing,
/// directory administration).
pub fn ensure_capability(actor: &Subject, action: Action, resource: Resource) -> Result<()> {
  if !actor.is_active() {
    tracing::warn!(actor = %actor.subject_id, status = %actor.status, "inactive account");
    return Err(Error::AccessDenied(resource.to_string()));
  }
  if !permits(actor.role, action, resource) {
    tracing::warn!(
      actor = %actor.subject_id,
      role = %actor.role,
      %action,
      %resource,
      "capability denied"
    );
    return Err(Error::AccessDenied(resource.to_string()));
  }
  Ok(())
}

/// Full check for an action on a resource owned by `owner`.
///
/// Order: capability, then admin, then ownership (students), then scope
/// membership (reviewers). A wrong role and a missing assignment produce the
/// same error.
pub fn authorize(
  actor: &Subject,
  action: Action,
  resource: Resource,
  owner: Uuid,
  scope: &Scope,
) -> Result<()> {
  ensure_capability(actor, action, resource)?;

  let allowed = match actor.role {
    Role::Admin => true,
    Role::Student => owner == actor.subject_id,
    Role::Lecturer | Role::Supervisor | Role::Hod => scope.contains(owner),
  };

  if !allowed {
    tracing::warn!(
      actor = %actor.subject_id,
      role = %actor.role,
      %owner,
      %action,
      %resource,
      "relationship denied"
    );
    return Err(Error::AccessDenied(resource.to_string()));
  }
  Ok(())
}
