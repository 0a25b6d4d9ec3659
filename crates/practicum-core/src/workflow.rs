//! The artifact lifecycle state machine.
//!
//! ```text
//! Task / Report:  PENDING ──submit──▶ SUBMITTED
//!                    │                    │
//!                    └──────review────────┴──▶ APPROVED | REJECTED
//!
//! Placement:      PENDING_APPROVAL ──review──▶ APPROVED | REJECTED
//! ```
//!
//! The owning student may edit or delete only while the artifact is in its
//! kind's open status. `APPROVED` and `REJECTED` have no exits.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  artifact::{ArtifactKind, ArtifactStatus},
};

/// A reviewer's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
  Approved,
  Rejected,
}

impl Decision {
  pub fn status(self) -> ArtifactStatus {
    match self {
      Self::Approved => ArtifactStatus::Approved,
      Self::Rejected => ArtifactStatus::Rejected,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Edit,
  Delete,
  Submit,
  Review(Decision),
}

/// Status a freshly created artifact of `kind` starts in.
pub fn initial_status(kind: ArtifactKind) -> ArtifactStatus {
  match kind {
    ArtifactKind::Task | ArtifactKind::Report => ArtifactStatus::Pending,
    ArtifactKind::Placement => ArtifactStatus::PendingApproval,
  }
}

/// Statuses a reviewer may decide from.
pub fn reviewable_from(kind: ArtifactKind) -> &'static [ArtifactStatus] {
  match kind {
    ArtifactKind::Task | ArtifactKind::Report => {
      &[ArtifactStatus::Pending, ArtifactStatus::Submitted]
    }
    ArtifactKind::Placement => &[ArtifactStatus::PendingApproval],
  }
}

/// The status an artifact moves to when `transition` is applied in
/// `current`, or `InvalidStateTransition` if the move is not defined.
///
/// `Edit` and `Delete` leave the status unchanged; a successful result only
/// means the precondition holds.
pub fn next_status(
  kind: ArtifactKind,
  current: ArtifactStatus,
  transition: Transition,
) -> Result<ArtifactStatus> {
  let open = initial_status(kind);
  let next = match transition {
    Transition::Edit | Transition::Delete if current == open => Some(current),
    Transition::Submit
      if kind != ArtifactKind::Placement && current == ArtifactStatus::Pending =>
    {
      Some(ArtifactStatus::Submitted)
    }
    Transition::Review(decision) if reviewable_from(kind).contains(&current) => {
      Some(decision.status())
    }
    _ => None,
  };

  next.ok_or_else(|| Error::InvalidStateTransition {
    item:   kind.into(),
    status: current.to_string(),
  })
}

/// Placements cannot be rejected without a reason; tasks and reports can.
pub fn check_review_comments(
  kind: ArtifactKind,
  decision: Decision,
  comments: Option<&str>,
) -> Result<()> {
  let blank = comments.is_none_or(|c| c.trim().is_empty());
  if kind == ArtifactKind::Placement && decision == Decision::Rejected && blank {
    return Err(Error::Validation(
      "a reason is required to reject a placement".into(),
    ));
  }
  Ok(())
}
