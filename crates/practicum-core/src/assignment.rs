//! Assignments: the explicit student ↔ reviewer relation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::ReviewerRole;

/// Authorizes `reviewer_id` to act on `student_id`'s work while active.
///
/// At most one active assignment exists per `(student_id, reviewer_role)`;
/// the store enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub student_id:    Uuid,
  pub reviewer_id:   Uuid,
  pub reviewer_role: ReviewerRole,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
  pub student_id:    Uuid,
  pub reviewer_id:   Uuid,
  pub reviewer_role: ReviewerRole,
}
