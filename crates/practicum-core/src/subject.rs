//! Subjects: the accounts known to the directory.
//!
//! A subject carries its role and its place in the organisation. Subjects are
//! never deleted; deactivation is a status change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The closed set of roles a subject can hold.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Student,
  Lecturer,
  Supervisor,
  Hod,
  Admin,
}

/// The roles that can hold an explicit student assignment or author an
/// evaluation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewerRole {
  Lecturer,
  Supervisor,
}

impl From<ReviewerRole> for Role {
  fn from(r: ReviewerRole) -> Self {
    match r {
      ReviewerRole::Lecturer => Role::Lecturer,
      ReviewerRole::Supervisor => Role::Supervisor,
    }
  }
}

impl TryFrom<Role> for ReviewerRole {
  type Error = Role;

  fn try_from(role: Role) -> Result<Self, Self::Error> {
    match role {
      Role::Lecturer => Ok(Self::Lecturer),
      Role::Supervisor => Ok(Self::Supervisor),
      other => Err(other),
    }
  }
}

/// Account status. Only `Active` subjects may act.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectStatus {
  #[default]
  Active,
  Inactive,
  PendingVerification,
}

/// A directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:          Uuid,
  pub name:                String,
  pub role:                Role,
  pub faculty_id:          Option<String>,
  pub department_id:       Option<String>,
  pub company_affiliation: Option<String>,
  pub status:              SubjectStatus,
  pub created_at:          DateTime<Utc>,
}

impl Subject {
  pub fn is_active(&self) -> bool { self.status == SubjectStatus::Active }
}

/// Input to [`crate::store::PortalStore::add_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub name:                String,
  pub role:                Role,
  pub faculty_id:          Option<String>,
  pub department_id:       Option<String>,
  pub company_affiliation: Option<String>,
}

impl NewSubject {
  pub fn new(name: impl Into<String>, role: Role) -> Self {
    Self {
      name: name.into(),
      role,
      faculty_id: None,
      department_id: None,
      company_affiliation: None,
    }
  }

  pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
    self.department_id = Some(department_id.into());
    self
  }

  pub fn in_faculty(mut self, faculty_id: impl Into<String>) -> Self {
    self.faculty_id = Some(faculty_id.into());
    self
  }
}

/// Administrative changes to an existing subject. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPatch {
  pub role:   Option<Role>,
  pub status: Option<SubjectStatus>,
}

impl SubjectPatch {
  pub fn is_empty(&self) -> bool { self.role.is_none() && self.status.is_none() }
}

/// Filter for [`crate::store::PortalStore::list_subjects`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectFilter {
  pub role:          Option<Role>,
  pub department_id: Option<String>,
}
