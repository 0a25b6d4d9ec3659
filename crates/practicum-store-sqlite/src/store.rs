//! [`SqliteStore`]: the SQLite implementation of [`PortalStore`] and
//! [`IdentityProvider`].
//!
//! Conditional writes are single `UPDATE … WHERE status = ?` statements, so the
//! row's status column is the serialization point between concurrent
//! reviewers. Multi-statement writes run inside one transaction.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use practicum_core::{
  artifact::{ArtifactBody, ArtifactFilter, ArtifactKind, ArtifactStatus, NewArtifact, StatusChange, WorkItem},
  assignment::{Assignment, NewAssignment},
  checkin::{CheckIn, CheckInReview, CheckInStatus, NewCheckIn},
  evaluation::{Evaluation, EvaluationRecord, UpsertOutcome},
  store::{IdentityProvider, PortalStore},
  subject::{NewSubject, ReviewerRole, Subject, SubjectFilter, SubjectPatch, SubjectStatus},
};

use crate::{
  Result,
  encode::{
    ARTIFACT_COLUMNS, ASSIGNMENT_COLUMNS, CHECKIN_COLUMNS, EVALUATION_COLUMNS,
    RawArtifact, RawAssignment, RawCheckIn, RawEvaluation, RawSubject, SUBJECT_COLUMNS,
    decode_uuid, encode_date, encode_dt, encode_uuid, encode_uuid_list,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Practicum store backed by a single SQLite file.
///
/// Cloning is cheap since the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn now() -> String { encode_dt(Utc::now()) }

fn select_subject(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawSubject>> {
  conn
    .query_row(
      &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
      [id],
      RawSubject::from_row,
    )
    .optional()
}

fn select_assignment(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawAssignment>> {
  conn
    .query_row(
      &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE assignment_id = ?1"),
      [id],
      RawAssignment::from_row,
    )
    .optional()
}

fn select_artifact(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawArtifact>> {
  conn
    .query_row(
      &format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE artifact_id = ?1"),
      [id],
      RawArtifact::from_row,
    )
    .optional()
}

fn select_checkin(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawCheckIn>> {
  conn
    .query_row(
      &format!("SELECT {CHECKIN_COLUMNS} FROM checkins WHERE checkin_id = ?1"),
      [id],
      RawCheckIn::from_row,
    )
    .optional()
}

fn load_scores(conn: &rusqlite::Connection, raw: &mut RawEvaluation) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "SELECT metric_key, score FROM evaluation_scores
     WHERE evaluation_id = ?1 ORDER BY metric_key",
  )?;
  raw.scores = stmt
    .query_map([&raw.evaluation_id], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(())
}

fn select_evaluation(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawEvaluation>> {
  let raw = conn
    .query_row(
      &format!("SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE evaluation_id = ?1"),
      [id],
      RawEvaluation::from_row,
    )
    .optional()?;
  match raw {
    Some(mut raw) => {
      load_scores(conn, &mut raw)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

/// `WHERE` fragment restricting `column` to `ids`, bound as a single JSON
/// array parameter `?{slot}` so large scopes stay under SQLite's variable
/// limit.
fn in_clause(column: &str, slot: usize, ids: &[Uuid]) -> (String, String) {
  (
    format!("{column} IN (SELECT value FROM json_each(?{slot}))"),
    encode_uuid_list(ids),
  )
}

// ─── IdentityProvider impl ───────────────────────────────────────────────────

impl IdentityProvider for SqliteStore {
  type Error = crate::Error;

  async fn resolve_token(&self, token_hash: &str) -> Result<Option<Uuid>> {
    let hash = token_hash.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id FROM access_tokens WHERE token_hash = ?1",
              [hash],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.as_deref().map(decode_uuid).transpose()
  }

  async fn issue_token(&self, subject_id: Uuid, token_hash: String) -> Result<()> {
    let id_str = encode_uuid(subject_id);
    let at_str = now();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO access_tokens (token_hash, subject_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PortalStore impl ────────────────────────────────────────────────────────

impl PortalStore for SqliteStore {
  type Error = crate::Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id:          Uuid::new_v4(),
      name:                input.name,
      role:                input.role,
      faculty_id:          input.faculty_id,
      department_id:       input.department_id,
      company_affiliation: input.company_affiliation,
      status:              SubjectStatus::Active,
      created_at:          Utc::now(),
    };

    let id_str     = encode_uuid(subject.subject_id);
    let name       = subject.name.clone();
    let role_str   = subject.role.to_string();
    let faculty    = subject.faculty_id.clone();
    let department = subject.department_id.clone();
    let company    = subject.company_affiliation.clone();
    let status_str = subject.status.to_string();
    let at_str     = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (
             subject_id, name, role, faculty_id, department_id,
             company_affiliation, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, name, role_str, faculty, department, company, status_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_subject(conn, &id_str)?))
      .await?;
    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>> {
    let mut conds: Vec<String> = vec![];
    let mut params: Vec<String> = vec![];
    if let Some(role) = filter.role {
      params.push(role.to_string());
      conds.push(format!("role = ?{}", params.len()));
    }
    if let Some(department) = &filter.department_id {
      params.push(department.clone());
      conds.push(format!("department_id = ?{}", params.len()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let sql = format!(
      "SELECT {SUBJECT_COLUMNS} FROM subjects {where_clause} ORDER BY created_at, rowid"
    );

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn update_subject(&self, id: Uuid, patch: SubjectPatch) -> Result<Option<Subject>> {
    let id_str     = encode_uuid(id);
    let role_str   = patch.role.map(|r| r.to_string());
    let status_str = patch.status.map(|s| s.to_string());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE subjects
              SET role   = COALESCE(?2, role),
                  status = COALESCE(?3, status)
            WHERE subject_id = ?1",
          rusqlite::params![id_str, role_str, status_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_subject(conn, &id_str)?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn add_assignment(&self, input: NewAssignment) -> Result<Option<Assignment>> {
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      student_id:    input.student_id,
      reviewer_id:   input.reviewer_id,
      reviewer_role: input.reviewer_role,
      is_active:     true,
      created_at:    Utc::now(),
    };

    let id_str       = encode_uuid(assignment.assignment_id);
    let student_str  = encode_uuid(assignment.student_id);
    let reviewer_str = encode_uuid(assignment.reviewer_id);
    let role_str     = assignment.reviewer_role.to_string();
    let at_str       = encode_dt(assignment.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM assignments
              WHERE student_id = ?1 AND reviewer_role = ?2 AND is_active = 1",
            rusqlite::params![student_str, role_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO assignments (
             assignment_id, student_id, reviewer_id, reviewer_role, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, student_str, reviewer_str, role_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(inserted.then_some(assignment))
  }

  async fn deactivate_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE assignments SET is_active = 0 WHERE assignment_id = ?1",
          [&id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_assignment(conn, &id_str)?)
      })
      .await?;
    raw.map(RawAssignment::into_assignment).transpose()
  }

  async fn list_active_assignments(
    &self,
    reviewer_id: Uuid,
    role: ReviewerRole,
  ) -> Result<Vec<Uuid>> {
    let reviewer_str = encode_uuid(reviewer_id);
    let role_str     = role.to_string();

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT student_id FROM assignments
            WHERE reviewer_id = ?1 AND reviewer_role = ?2 AND is_active = 1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![reviewer_str, role_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Artifacts ─────────────────────────────────────────────────────────────

  async fn create_artifact(&self, input: NewArtifact) -> Result<WorkItem> {
    let created_at = Utc::now();
    let item = WorkItem {
      artifact_id:       Uuid::new_v4(),
      student_id:        input.student_id,
      status:            input.status,
      body:              input.body,
      reviewer_comments: Default::default(),
      reviewed_by:       None,
      created_at,
      updated_at:        created_at,
    };

    let id_str      = encode_uuid(item.artifact_id);
    let kind_str    = item.kind().to_string();
    let student_str = encode_uuid(item.student_id);
    let status_str  = item.status.to_string();
    let body_str    = item.body.to_json()?.to_string();
    let at_str      = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO artifacts (
             artifact_id, kind, student_id, status, body_json, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, kind_str, student_str, status_str, body_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn get_artifact(&self, kind: ArtifactKind, id: Uuid) -> Result<Option<WorkItem>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_artifact(conn, &id_str)?))
      .await?;
    let item = raw.map(RawArtifact::into_work_item).transpose()?;
    Ok(item.filter(|i| i.kind() == kind))
  }

  async fn update_artifact_body(
    &self,
    id: Uuid,
    expected: ArtifactStatus,
    body: ArtifactBody,
  ) -> Result<Option<WorkItem>> {
    let id_str     = encode_uuid(id);
    let kind_str   = body.kind().to_string();
    let status_str = expected.to_string();
    let body_str   = body.to_json()?.to_string();
    let at_str     = now();

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE artifacts SET body_json = ?1, updated_at = ?2
            WHERE artifact_id = ?3 AND kind = ?4 AND status = ?5",
          rusqlite::params![body_str, at_str, id_str, kind_str, status_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_artifact(conn, &id_str)?)
      })
      .await?;

    raw.map(RawArtifact::into_work_item).transpose()
  }

  async fn update_artifact_status(&self, change: StatusChange) -> Result<Option<WorkItem>> {
    let id_str       = encode_uuid(change.artifact_id);
    let kind_str     = change.kind.to_string();
    let expected_str = change.expected.to_string();
    let new_str      = change.new_status.to_string();
    let role_key     = change.actor_role.to_string();
    let comments     = change.comments;
    // Only a decision records who decided; a student's submit does not.
    let reviewed_by  = change
      .new_status
      .is_terminal()
      .then(|| encode_uuid(change.actor_id));
    let at_str       = now();

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE artifacts
              SET status            = ?1,
                  reviewer_comments = CASE WHEN ?2 IS NULL THEN reviewer_comments
                                           ELSE json_set(reviewer_comments, '$.' || ?3, ?2)
                                      END,
                  reviewed_by       = COALESCE(?4, reviewed_by),
                  updated_at        = ?5
            WHERE artifact_id = ?6 AND kind = ?7 AND status = ?8",
          rusqlite::params![
            new_str, comments, role_key, reviewed_by, at_str, id_str, kind_str, expected_str
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_artifact(conn, &id_str)?)
      })
      .await?;

    raw.map(RawArtifact::into_work_item).transpose()
  }

  async fn delete_artifact(
    &self,
    kind: ArtifactKind,
    id: Uuid,
    expected: ArtifactStatus,
  ) -> Result<bool> {
    let id_str     = encode_uuid(id);
    let kind_str   = kind.to_string();
    let status_str = expected.to_string();

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM artifacts WHERE artifact_id = ?1 AND kind = ?2 AND status = ?3",
          rusqlite::params![id_str, kind_str, status_str],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  async fn list_artifacts(
    &self,
    kind: ArtifactKind,
    filter: &ArtifactFilter,
  ) -> Result<Vec<WorkItem>> {
    if filter.student_ids.as_ref().is_some_and(Vec::is_empty) {
      return Ok(Vec::new());
    }

    let mut conds  = vec!["kind = ?1".to_string()];
    let mut params = vec![kind.to_string()];
    if let Some(status) = filter.status {
      params.push(status.to_string());
      conds.push(format!("status = ?{}", params.len()));
    }
    if let Some(ids) = &filter.student_ids {
      let (cond, ids) = in_clause("student_id", params.len() + 1, ids);
      conds.push(cond);
      params.push(ids);
    }
    let sql = format!(
      "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE {}
        ORDER BY created_at DESC, rowid DESC",
      conds.join(" AND ")
    );

    let raws: Vec<RawArtifact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawArtifact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArtifact::into_work_item).collect()
  }

  // ── Evaluations ───────────────────────────────────────────────────────────

  async fn upsert_evaluation(
    &self,
    record: EvaluationRecord,
  ) -> Result<(Evaluation, UpsertOutcome)> {
    let new_id_str    = encode_uuid(Uuid::new_v4());
    let student_str   = encode_uuid(record.student_id);
    let evaluator_str = encode_uuid(record.evaluator_id);
    let role_str      = record.evaluator_role.to_string();
    let date_str      = encode_date(record.date);
    let comments      = record.overall_comments;
    let scores        = record.scores;
    let at_str        = now();

    let (raw, outcome) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT evaluation_id FROM evaluations
              WHERE student_id = ?1 AND evaluator_id = ?2 AND date = ?3",
            rusqlite::params![student_str, evaluator_str, date_str],
            |row| row.get(0),
          )
          .optional()?;

        let (id_str, outcome) = match existing {
          Some(id_str) => {
            tx.execute(
              "UPDATE evaluations
                  SET evaluator_role = ?1, overall_comments = ?2, updated_at = ?3
                WHERE evaluation_id = ?4",
              rusqlite::params![role_str, comments, at_str, id_str],
            )?;
            tx.execute("DELETE FROM evaluation_scores WHERE evaluation_id = ?1", [&id_str])?;
            (id_str, UpsertOutcome::Updated)
          }
          None => {
            tx.execute(
              "INSERT INTO evaluations (
                 evaluation_id, student_id, evaluator_id, evaluator_role, date,
                 overall_comments, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
              rusqlite::params![
                new_id_str, student_str, evaluator_str, role_str, date_str, comments, at_str
              ],
            )?;
            (new_id_str, UpsertOutcome::Created)
          }
        };

        {
          let mut stmt = tx.prepare(
            "INSERT INTO evaluation_scores (evaluation_id, metric_key, score)
             VALUES (?1, ?2, ?3)",
          )?;
          for (metric, score) in &scores {
            stmt.execute(rusqlite::params![id_str, metric, i64::from(*score)])?;
          }
        }

        let raw = select_evaluation(&tx, &id_str)?;
        tx.commit()?;
        Ok((raw, outcome))
      })
      .await?;

    let evaluation = raw
      .ok_or_else(|| crate::Error::Decode {
        column: "evaluations.evaluation_id",
        value:  "row vanished inside its own transaction".into(),
      })?
      .into_evaluation()?;
    Ok((evaluation, outcome))
  }

  async fn list_evaluations(&self, student_ids: Option<&[Uuid]>) -> Result<Vec<Evaluation>> {
    let (where_clause, params) = match student_ids {
      Some([]) => return Ok(Vec::new()),
      Some(ids) => {
        let (cond, ids) = in_clause("student_id", 1, ids);
        (format!("WHERE {cond}"), vec![ids])
      }
      None => (String::new(), Vec::new()),
    };
    let sql = format!(
      "SELECT {EVALUATION_COLUMNS} FROM evaluations {where_clause}
        ORDER BY date DESC, created_at DESC"
    );

    let raws: Vec<RawEvaluation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawEvaluation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for raw in &mut rows {
          load_scores(conn, raw)?;
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvaluation::into_evaluation).collect()
  }

  // ── Check-ins ─────────────────────────────────────────────────────────────

  async fn create_checkin(&self, input: NewCheckIn) -> Result<CheckIn> {
    let recorded_at = Utc::now();
    let checkin = CheckIn {
      checkin_id:          Uuid::new_v4(),
      student_id:          input.student_id,
      recorded_at,
      location:            input.location,
      gps_verified:        input.gps_verified,
      outside_geofence:    input.outside_geofence,
      manual_reason:       input.manual_reason,
      photo_ref:           input.photo_ref,
      supervisor_status:   CheckInStatus::Pending,
      supervisor_comments: None,
      updated_at:          recorded_at,
    };

    let id_str      = encode_uuid(checkin.checkin_id);
    let student_str = encode_uuid(checkin.student_id);
    let at_str      = encode_dt(recorded_at);
    let latitude    = checkin.location.map(|p| p.latitude);
    let longitude   = checkin.location.map(|p| p.longitude);
    let gps         = checkin.gps_verified;
    let outside     = checkin.outside_geofence;
    let reason      = checkin.manual_reason.clone();
    let photo       = checkin.photo_ref.clone();
    let status_str  = checkin.supervisor_status.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO checkins (
             checkin_id, student_id, recorded_at, latitude, longitude,
             gps_verified, outside_geofence, manual_reason, photo_ref,
             supervisor_status, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?3)",
          rusqlite::params![
            id_str, student_str, at_str, latitude, longitude, gps, outside, reason,
            photo, status_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(checkin)
  }

  async fn get_checkin(&self, id: Uuid) -> Result<Option<CheckIn>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_checkin(conn, &id_str)?))
      .await?;
    raw.map(RawCheckIn::into_checkin).transpose()
  }

  async fn update_checkin_status(&self, review: CheckInReview) -> Result<Option<CheckIn>> {
    let id_str       = encode_uuid(review.checkin_id);
    let expected_str = review.expected.to_string();
    let new_str      = review.new_status.to_string();
    let comments     = review.comments;
    let at_str       = now();

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE checkins
              SET supervisor_status   = ?1,
                  supervisor_comments = COALESCE(?2, supervisor_comments),
                  updated_at          = ?3
            WHERE checkin_id = ?4 AND supervisor_status = ?5",
          rusqlite::params![new_str, comments, at_str, id_str, expected_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_checkin(conn, &id_str)?)
      })
      .await?;

    raw.map(RawCheckIn::into_checkin).transpose()
  }

  async fn list_checkins(&self, student_ids: Option<&[Uuid]>) -> Result<Vec<CheckIn>> {
    let (where_clause, params) = match student_ids {
      Some([]) => return Ok(Vec::new()),
      Some(ids) => {
        let (cond, ids) = in_clause("student_id", 1, ids);
        (format!("WHERE {cond}"), vec![ids])
      }
      None => (String::new(), Vec::new()),
    };
    let sql = format!(
      "SELECT {CHECKIN_COLUMNS} FROM checkins {where_clause}
        ORDER BY recorded_at DESC, rowid DESC"
    );

    let raws: Vec<RawCheckIn> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawCheckIn::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCheckIn::into_checkin).collect()
  }
}
