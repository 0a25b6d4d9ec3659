//! Work items: the student-produced artifacts that pass through review.
//!
//! Tasks, reports and placements share one record shape ([`WorkItem`]) and
//! one lifecycle; the kind-specific payload lives in [`ArtifactBody`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, geofence::GeoPoint, subject::Role};

// ─── Kind & status ───────────────────────────────────────────────────────────

/// The artifact kinds that follow the review lifecycle. Appears in URL paths,
/// hence lowercase.
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
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactKind {
  Task,
  Report,
  Placement,
}

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
pub enum ArtifactStatus {
  /// Task/report owned by the student, not yet reviewed.
  Pending,
  /// Task/report handed over by the student for review.
  Submitted,
  /// Placement awaiting the head of department's decision.
  PendingApproval,
  Approved,
  Rejected,
}

impl ArtifactStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Approved | Self::Rejected)
  }
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// A daily task log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBody {
  pub title:       String,
  pub description: Option<String>,
  pub date:        NaiveDate,
  pub hours_spent: Option<f32>,
}

/// A daily report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBody {
  pub date:       NaiveDate,
  pub summary:    String,
  pub challenges: Option<String>,
  pub next_steps: Option<String>,
}

/// Where and when the internship takes place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementBody {
  pub company_name:     String,
  pub company_address:  Option<String>,
  pub position:         Option<String>,
  pub start_date:       NaiveDate,
  pub end_date:         Option<NaiveDate>,
  pub supervisor_name:  Option<String>,
  pub supervisor_email: Option<String>,
  /// Workplace coordinates used as the check-in geofence centre once the
  /// placement is approved.
  pub latitude:         Option<f64>,
  pub longitude:        Option<f64>,
}

impl PlacementBody {
  pub fn workplace(&self) -> Option<GeoPoint> {
    match (self.latitude, self.longitude) {
      (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
      _ => None,
    }
  }
}

/// The typed payload of a work item. The variant name is the `kind`
/// discriminant stored alongside the JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ArtifactBody {
  Task(TaskBody),
  Report(ReportBody),
  Placement(PlacementBody),
}

impl ArtifactBody {
  pub fn kind(&self) -> ArtifactKind {
    match self {
      Self::Task(_) => ArtifactKind::Task,
      Self::Report(_) => ArtifactKind::Report,
      Self::Placement(_) => ArtifactKind::Placement,
    }
  }

  /// Serialise the inner payload (without the kind tag).
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Rebuild a body from its kind and bare payload.
  pub fn from_parts(kind: ArtifactKind, data: serde_json::Value) -> Result<Self> {
    let wrapped = serde_json::json!({ "kind": kind, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }

  /// Field-level checks that serde cannot express.
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Task(t) => {
        require_text("title", &t.title)?;
        if let Some(h) = t.hours_spent
          && !(0.0..=24.0).contains(&h)
        {
          return Err(Error::Validation(format!(
            "hours_spent must be between 0 and 24, got {h}"
          )));
        }
      }
      Self::Report(r) => require_text("summary", &r.summary)?,
      Self::Placement(p) => {
        require_text("company_name", &p.company_name)?;
        if let Some(end) = p.end_date
          && end < p.start_date
        {
          return Err(Error::Validation(
            "end_date must not precede start_date".into(),
          ));
        }
        match (p.latitude, p.longitude) {
          (Some(latitude), Some(longitude)) => {
            GeoPoint { latitude, longitude }.validate()?
          }
          (None, None) => {}
          _ => {
            return Err(Error::Validation(
              "latitude and longitude must be supplied together".into(),
            ));
          }
        }
      }
    }
    Ok(())
  }
}

fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{field} must not be empty")));
  }
  Ok(())
}

// ─── WorkItem ────────────────────────────────────────────────────────────────

/// A persisted task, report or placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
  pub artifact_id:       Uuid,
  pub student_id:        Uuid,
  pub status:            ArtifactStatus,
  pub body:              ArtifactBody,
  /// Review comments keyed by the role that left them, so a lecturer's and a
  /// supervisor's notes never overwrite each other.
  pub reviewer_comments: BTreeMap<Role, String>,
  pub reviewed_by:       Option<Uuid>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl WorkItem {
  pub fn kind(&self) -> ArtifactKind { self.body.kind() }
}

/// Input to [`crate::store::PortalStore::create_artifact`].
#[derive(Debug, Clone)]
pub struct NewArtifact {
  pub student_id: Uuid,
  pub status:     ArtifactStatus,
  pub body:       ArtifactBody,
}

/// A conditional status write: applied only if the stored status still equals
/// `expected`.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub kind:        ArtifactKind,
  pub artifact_id: Uuid,
  pub expected:    ArtifactStatus,
  pub new_status:  ArtifactStatus,
  pub actor_id:    Uuid,
  pub actor_role:  Role,
  pub comments:    Option<String>,
}

/// Parameters for [`crate::store::PortalStore::list_artifacts`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactFilter {
  /// Restrict to these owners; `None` means every student.
  pub student_ids: Option<Vec<Uuid>>,
  pub status:      Option<ArtifactStatus>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn placement() -> PlacementBody {
    PlacementBody {
      company_name:     "Acme Ltd".into(),
      company_address:  None,
      position:         Some("Intern".into()),
      start_date:       NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
      end_date:         Some(NaiveDate::from_ymd_opt(2026, 4, 5).unwrap()),
      supervisor_name:  None,
      supervisor_email: None,
      latitude:         None,
      longitude:        None,
    }
  }

  #[test]
  fn body_parts_rebuild_the_same_variant() {
    let body = ArtifactBody::Task(TaskBody {
      title:       "Wire the router".into(),
      description: None,
      date:        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
      hours_spent: Some(6.5),
    });
    let data = body.to_json().unwrap();
    assert!(data.get("kind").is_none());
    let rebuilt = ArtifactBody::from_parts(ArtifactKind::Task, data).unwrap();
    assert_eq!(rebuilt, body);
  }

  #[test]
  fn payload_of_wrong_kind_is_rejected() {
    let data = serde_json::json!({ "title": "x", "date": "2026-02-01" });
    assert!(ArtifactBody::from_parts(ArtifactKind::Placement, data).is_err());
  }

  #[test]
  fn blank_title_fails_validation() {
    let body = ArtifactBody::Task(TaskBody {
      title:       "   ".into(),
      description: None,
      date:        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
      hours_spent: None,
    });
    assert!(matches!(body.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn placement_dates_must_be_ordered() {
    let mut p = placement();
    p.end_date = Some(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    assert!(ArtifactBody::Placement(p).validate().is_err());
  }

  #[test]
  fn placement_needs_both_coordinates() {
    let mut p = placement();
    p.latitude = Some(6.5);
    assert!(ArtifactBody::Placement(p.clone()).validate().is_err());
    p.longitude = Some(3.4);
    assert!(ArtifactBody::Placement(p.clone()).validate().is_ok());
    assert!(p.workplace().is_some());
  }

  #[test]
  fn status_spelling_is_screaming_snake() {
    assert_eq!(ArtifactStatus::PendingApproval.to_string(), "PENDING_APPROVAL");
    assert_eq!(
      "SUBMITTED".parse::<ArtifactStatus>().unwrap(),
      ArtifactStatus::Submitted
    );
    assert_eq!(
      serde_json::to_string(&ArtifactStatus::Approved).unwrap(),
      "\"APPROVED\""
    );
  }
}
