//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates `YYYY-MM-DD`. Enums are stored in
//! their wire spelling (`STUDENT`, `PENDING_APPROVAL`, `task`). UUIDs are
//! hyphenated lowercase strings.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use practicum_core::{
  artifact::{ArtifactBody, ArtifactKind, WorkItem},
  assignment::Assignment,
  checkin::CheckIn,
  evaluation::Evaluation,
  geofence::GeoPoint,
  subject::{Role, Subject},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Fixed-width UTC timestamps, so that text ordering is chronological.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse any `strum`-derived enum from its column spelling.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

pub fn decode_comments(s: &str) -> Result<BTreeMap<Role, String>> {
  Ok(serde_json::from_str(s)?)
}

/// A JSON array of encoded ids, for `json_each` membership tests.
pub fn encode_uuid_list(ids: &[Uuid]) -> String {
  serde_json::Value::from(ids.iter().copied().map(encode_uuid).collect::<Vec<_>>()).to_string()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str = "subject_id, name, role, faculty_id, department_id, \
   company_affiliation, status, created_at";

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:          String,
  pub name:                String,
  pub role:                String,
  pub faculty_id:          Option<String>,
  pub department_id:       Option<String>,
  pub company_affiliation: Option<String>,
  pub status:              String,
  pub created_at:          String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:          row.get(0)?,
      name:                row.get(1)?,
      role:                row.get(2)?,
      faculty_id:          row.get(3)?,
      department_id:       row.get(4)?,
      company_affiliation: row.get(5)?,
      status:              row.get(6)?,
      created_at:          row.get(7)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:          decode_uuid(&self.subject_id)?,
      name:                self.name,
      role:                decode_enum("subjects.role", &self.role)?,
      faculty_id:          self.faculty_id,
      department_id:       self.department_id,
      company_affiliation: self.company_affiliation,
      status:              decode_enum("subjects.status", &self.status)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub const ASSIGNMENT_COLUMNS: &str =
  "assignment_id, student_id, reviewer_id, reviewer_role, is_active, created_at";

pub struct RawAssignment {
  pub assignment_id: String,
  pub student_id:    String,
  pub reviewer_id:   String,
  pub reviewer_role: String,
  pub is_active:     bool,
  pub created_at:    String,
}

impl RawAssignment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      student_id:    row.get(1)?,
      reviewer_id:   row.get(2)?,
      reviewer_role: row.get(3)?,
      is_active:     row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      student_id:    decode_uuid(&self.student_id)?,
      reviewer_id:   decode_uuid(&self.reviewer_id)?,
      reviewer_role: decode_enum("assignments.reviewer_role", &self.reviewer_role)?,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const ARTIFACT_COLUMNS: &str = "artifact_id, kind, student_id, status, body_json, \
   reviewer_comments, reviewed_by, created_at, updated_at";

pub struct RawArtifact {
  pub artifact_id:       String,
  pub kind:              String,
  pub student_id:        String,
  pub status:            String,
  pub body_json:         String,
  pub reviewer_comments: String,
  pub reviewed_by:       Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawArtifact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      artifact_id:       row.get(0)?,
      kind:              row.get(1)?,
      student_id:        row.get(2)?,
      status:            row.get(3)?,
      body_json:         row.get(4)?,
      reviewer_comments: row.get(5)?,
      reviewed_by:       row.get(6)?,
      created_at:        row.get(7)?,
      updated_at:        row.get(8)?,
    })
  }

  pub fn into_work_item(self) -> Result<WorkItem> {
    let kind: ArtifactKind = decode_enum("artifacts.kind", &self.kind)?;
    let data: serde_json::Value = serde_json::from_str(&self.body_json)?;
    Ok(WorkItem {
      artifact_id:       decode_uuid(&self.artifact_id)?,
      student_id:        decode_uuid(&self.student_id)?,
      status:            decode_enum("artifacts.status", &self.status)?,
      body:              ArtifactBody::from_parts(kind, data)?,
      reviewer_comments: decode_comments(&self.reviewer_comments)?,
      reviewed_by:       self.reviewed_by.as_deref().map(decode_uuid).transpose()?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

pub const EVALUATION_COLUMNS: &str = "evaluation_id, student_id, evaluator_id, \
   evaluator_role, date, overall_comments, created_at, updated_at";

/// An `evaluations` row plus its `evaluation_scores` rows.
pub struct RawEvaluation {
  pub evaluation_id:    String,
  pub student_id:       String,
  pub evaluator_id:     String,
  pub evaluator_role:   String,
  pub date:             String,
  pub overall_comments: Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
  pub scores:           Vec<(String, i64)>,
}

impl RawEvaluation {
  /// Reads the evaluation columns; `scores` is filled in by the caller.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      evaluation_id:    row.get(0)?,
      student_id:       row.get(1)?,
      evaluator_id:     row.get(2)?,
      evaluator_role:   row.get(3)?,
      date:             row.get(4)?,
      overall_comments: row.get(5)?,
      created_at:       row.get(6)?,
      updated_at:       row.get(7)?,
      scores:           Vec::new(),
    })
  }

  pub fn into_evaluation(self) -> Result<Evaluation> {
    let scores = self
      .scores
      .into_iter()
      .map(|(metric, score)| {
        let score = u8::try_from(score).map_err(|_| Error::Decode {
          column: "evaluation_scores.score",
          value:  score.to_string(),
        })?;
        Ok((metric, score))
      })
      .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(Evaluation {
      evaluation_id: decode_uuid(&self.evaluation_id)?,
      student_id: decode_uuid(&self.student_id)?,
      evaluator_id: decode_uuid(&self.evaluator_id)?,
      evaluator_role: decode_enum("evaluations.evaluator_role", &self.evaluator_role)?,
      date: decode_date(&self.date)?,
      scores,
      overall_comments: self.overall_comments,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const CHECKIN_COLUMNS: &str = "checkin_id, student_id, recorded_at, latitude, \
   longitude, gps_verified, outside_geofence, manual_reason, photo_ref, \
   supervisor_status, supervisor_comments, updated_at";

pub struct RawCheckIn {
  pub checkin_id:          String,
  pub student_id:          String,
  pub recorded_at:         String,
  pub latitude:            Option<f64>,
  pub longitude:           Option<f64>,
  pub gps_verified:        bool,
  pub outside_geofence:    bool,
  pub manual_reason:       Option<String>,
  pub photo_ref:           Option<String>,
  pub supervisor_status:   String,
  pub supervisor_comments: Option<String>,
  pub updated_at:          String,
}

impl RawCheckIn {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      checkin_id:          row.get(0)?,
      student_id:          row.get(1)?,
      recorded_at:         row.get(2)?,
      latitude:            row.get(3)?,
      longitude:           row.get(4)?,
      gps_verified:        row.get(5)?,
      outside_geofence:    row.get(6)?,
      manual_reason:       row.get(7)?,
      photo_ref:           row.get(8)?,
      supervisor_status:   row.get(9)?,
      supervisor_comments: row.get(10)?,
      updated_at:          row.get(11)?,
    })
  }

  pub fn into_checkin(self) -> Result<CheckIn> {
    let location = match (self.latitude, self.longitude) {
      (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
      _ => None,
    };
    Ok(CheckIn {
      checkin_id: decode_uuid(&self.checkin_id)?,
      student_id: decode_uuid(&self.student_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
      location,
      gps_verified: self.gps_verified,
      outside_geofence: self.outside_geofence,
      manual_reason: self.manual_reason,
      photo_ref: self.photo_ref,
      supervisor_status: decode_enum("checkins.supervisor_status", &self.supervisor_status)?,
      supervisor_comments: self.supervisor_comments,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use practicum_core::{artifact::ArtifactStatus, subject::SubjectStatus};

  use super::*;

  #[test]
  fn enums_decode_from_column_spelling() {
    assert_eq!(decode_enum::<Role>("role", "HOD").unwrap(), Role::Hod);
    assert_eq!(
      decode_enum::<SubjectStatus>("status", "PENDING_VERIFICATION").unwrap(),
      SubjectStatus::PendingVerification
    );
    assert_eq!(
      decode_enum::<ArtifactStatus>("status", "PENDING_APPROVAL").unwrap(),
      ArtifactStatus::PendingApproval
    );
    assert_eq!(
      decode_enum::<ArtifactKind>("kind", "placement").unwrap(),
      ArtifactKind::Placement
    );
  }

  #[test]
  fn unknown_enum_value_is_a_decode_error() {
    let err = decode_enum::<Role>("subjects.role", "DEAN").unwrap_err();
    assert!(matches!(err, Error::Decode { column: "subjects.role", .. }));
  }

  #[test]
  fn uuid_lists_encode_as_one_json_array() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    assert_eq!(
      encode_uuid_list(&[a, b]),
      format!("[\"{}\",\"{}\"]", encode_uuid(a), encode_uuid(b))
    );
    assert_eq!(encode_uuid_list(&[]), "[]");
  }

  #[test]
  fn comments_are_keyed_by_role() {
    let mut comments = BTreeMap::new();
    comments.insert(Role::Lecturer, "Good".to_string());
    comments.insert(Role::Supervisor, "Late twice".to_string());
    let s = serde_json::to_string(&comments).unwrap();
    assert!(s.contains("\"LECTURER\""));
    assert_eq!(decode_comments(&s).unwrap(), comments);
  }
}
