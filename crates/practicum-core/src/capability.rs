//! The role capability table.
//!
//! Which role may attempt which action on which kind of resource, before any
//! relationship (ownership, assignment, department) is considered.

use serde::Serialize;
use strum::Display;

use crate::{artifact::ArtifactKind, subject::Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Read,
  Create,
  Update,
  Delete,
  /// Hand a task or report over for review.
  Submit,
  /// Approve or reject an artifact.
  Review,
  /// Write a scorecard.
  Evaluate,
  /// Record a check-in.
  Record,
  /// Confirm or flag a check-in.
  Verify,
  /// Directory and assignment management.
  Administer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
  Artifact(ArtifactKind),
  Evaluation,
  CheckIn,
  Directory,
}

impl std::fmt::Display for Resource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Artifact(kind) => write!(f, "{kind}"),
      Self::Evaluation => f.write_str("evaluation"),
      Self::CheckIn => f.write_str("check-in"),
      Self::Directory => f.write_str("directory"),
    }
  }
}

/// Whether `role` may ever perform `action` on `resource`.
pub fn permits(role: Role, action: Action, resource: Resource) -> bool {
  use Action::*;
  use ArtifactKind::{Placement, Report, Task};
  use Resource::*;

  match (role, resource) {
    (Role::Student, Artifact(Task | Report)) => {
      matches!(action, Read | Create | Update | Delete | Submit)
    }
    (Role::Student, Artifact(Placement)) => {
      matches!(action, Read | Create | Update | Delete)
    }
    (Role::Student, Evaluation) => action == Read,
    (Role::Student, CheckIn) => matches!(action, Read | Record),

    (Role::Lecturer, Artifact(Task | Report)) => matches!(action, Read | Review),
    (Role::Lecturer, Artifact(Placement)) => action == Read,
    (Role::Lecturer, Evaluation) => matches!(action, Read | Evaluate),
    (Role::Lecturer, CheckIn) => action == Read,

    (Role::Supervisor, Artifact(Task | Report)) => matches!(action, Read | Review),
    (Role::Supervisor, Artifact(Placement)) => action == Read,
    (Role::Supervisor, Evaluation) => matches!(action, Read | Evaluate),
    (Role::Supervisor, CheckIn) => matches!(action, Read | Verify),

    (Role::Hod, Artifact(_)) => matches!(action, Read | Review),
    (Role::Hod, Evaluation | CheckIn) => action == Read,

    (Role::Admin, Artifact(_)) => matches!(action, Read | Review),
    (Role::Admin, Evaluation | CheckIn) => action == Read,
    (Role::Admin, Directory) => action == Administer,

    (_, Directory) => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_ROLES: [Role; 5] =
    [Role::Student, Role::Lecturer, Role::Supervisor, Role::Hod, Role::Admin];

  #[test]
  fn only_students_create_artifacts() {
    for role in ALL_ROLES {
      for kind in [ArtifactKind::Task, ArtifactKind::Report, ArtifactKind::Placement] {
        assert_eq!(
          permits(role, Action::Create, Resource::Artifact(kind)),
          role == Role::Student,
          "{role} create {kind}"
        );
      }
    }
  }

  #[test]
  fn placement_review_belongs_to_hod_and_admin() {
    let placement = Resource::Artifact(ArtifactKind::Placement);
    assert!(permits(Role::Hod, Action::Review, placement));
    assert!(permits(Role::Admin, Action::Review, placement));
    assert!(!permits(Role::Lecturer, Action::Review, placement));
    assert!(!permits(Role::Supervisor, Action::Review, placement));
    assert!(!permits(Role::Student, Action::Review, placement));
  }

  #[test]
  fn hod_reviews_every_kind() {
    for kind in [ArtifactKind::Task, ArtifactKind::Report, ArtifactKind::Placement] {
      assert!(permits(Role::Hod, Action::Review, Resource::Artifact(kind)), "{kind}");
    }
  }

  #[test]
  fn students_never_review() {
    for kind in [ArtifactKind::Task, ArtifactKind::Report, ArtifactKind::Placement] {
      assert!(!permits(Role::Student, Action::Review, Resource::Artifact(kind)));
    }
  }

  #[test]
  fn only_supervisors_verify_check_ins() {
    for role in ALL_ROLES {
      assert_eq!(
        permits(role, Action::Verify, Resource::CheckIn),
        role == Role::Supervisor
      );
    }
  }

  #[test]
  fn students_cannot_submit_placements() {
    assert!(!permits(
      Role::Student,
      Action::Submit,
      Resource::Artifact(ArtifactKind::Placement)
    ));
  }

  #[test]
  fn directory_is_admin_only() {
    for role in ALL_ROLES {
      assert_eq!(
        permits(role, Action::Administer, Resource::Directory),
        role == Role::Admin
      );
    }
  }

  #[test]
  fn every_role_can_read_artifacts() {
    for role in ALL_ROLES {
      assert!(permits(role, Action::Read, Resource::Artifact(ArtifactKind::Task)));
    }
  }
}
