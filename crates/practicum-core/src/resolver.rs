//! Assignment resolution: which students an actor may act upon.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
  Error, Result,
  store::PortalStore,
  subject::{ReviewerRole, Role, Subject, SubjectFilter},
};

/// The set of students an actor is authorized over, as of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
  /// Every student (admins).
  All,
  Students(HashSet<Uuid>),
}

impl Scope {
  pub fn contains(&self, student_id: Uuid) -> bool {
    match self {
      Self::All => true,
      Self::Students(ids) => ids.contains(&student_id),
    }
  }

  /// `true` only for an explicit, empty student set.
  pub fn is_empty(&self) -> bool {
    matches!(self, Self::Students(ids) if ids.is_empty())
  }

  /// The owner filter to hand to a store listing; `None` means unrestricted.
  pub fn student_ids(&self) -> Option<Vec<Uuid>> {
    match self {
      Self::All => None,
      Self::Students(ids) => {
        let mut ids: Vec<Uuid> = ids.iter().copied().collect();
        ids.sort_unstable();
        Some(ids)
      }
    }
  }
}

/// Resolve `actor`'s scope from current assignment and directory data.
///
/// - Students are scoped to themselves.
/// - Lecturers and supervisors get their actively assigned students.
/// - Heads of department get every student in their department.
/// - Admins get [`Scope::All`] without touching the store.
///
/// Nothing is cached; assignments may change between requests.
pub async fn resolve_scope<S>(store: &S, actor: &Subject) -> Result<Scope>
where
  S: PortalStore,
{
  let scope = match actor.role {
    Role::Admin => Scope::All,
    Role::Student => Scope::Students(HashSet::from([actor.subject_id])),
    Role::Lecturer => assigned(store, actor, ReviewerRole::Lecturer).await?,
    Role::Supervisor => assigned(store, actor, ReviewerRole::Supervisor).await?,
    Role::Hod => {
      let department_id = actor
        .department_id
        .clone()
        .filter(|d| !d.trim().is_empty())
        .ok_or(Error::DepartmentNotFound(actor.subject_id))?;
      let filter = SubjectFilter {
        role:          Some(Role::Student),
        department_id: Some(department_id),
      };
      let students = store
        .list_subjects(&filter)
        .await
        .map_err(Error::unavailable)?;
      Scope::Students(students.into_iter().map(|s| s.subject_id).collect())
    }
  };

  tracing::debug!(
    actor = %actor.subject_id,
    role = %actor.role,
    students = ?scope.student_ids().map(|ids| ids.len()),
    "resolved scope"
  );
  Ok(scope)
}

async fn assigned<S>(store: &S, actor: &Subject, role: ReviewerRole) -> Result<Scope>
where
  S: PortalStore,
{
  let ids = store
    .list_active_assignments(actor.subject_id, role)
    .await
    .map_err(Error::unavailable)?;
  Ok(Scope::Students(ids.into_iter().collect()))
}
