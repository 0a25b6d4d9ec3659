//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use practicum_core::{
  artifact::{
    ArtifactBody, ArtifactFilter, ArtifactKind, ArtifactStatus, NewArtifact, StatusChange,
    TaskBody,
  },
  assignment::NewAssignment,
  checkin::{CheckInReview, CheckInStatus, NewCheckIn},
  evaluation::{EvaluationRecord, UpsertOutcome},
  geofence::GeoPoint,
  store::{IdentityProvider, PortalStore},
  subject::{NewSubject, ReviewerRole, Role, SubjectFilter, SubjectPatch, SubjectStatus},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

fn task(title: &str) -> ArtifactBody {
  ArtifactBody::Task(TaskBody {
    title:       title.into(),
    description: Some("wired the staging rack".into()),
    date:        day(4),
    hours_spent: Some(6.5),
  })
}

async fn student(s: &SqliteStore, department: &str) -> Uuid {
  s.add_subject(NewSubject::new("Ada", Role::Student).in_department(department))
    .await
    .unwrap()
    .subject_id
}

async fn staff(s: &SqliteStore, role: Role) -> Uuid {
  s.add_subject(NewSubject::new("Staff", role)).await.unwrap().subject_id
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;

  let subject = s
    .add_subject(NewSubject::new("Grace", Role::Hod).in_department("D005").in_faculty("F1"))
    .await
    .unwrap();
  assert_eq!(subject.status, SubjectStatus::Active);

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Grace");
  assert_eq!(fetched.role, Role::Hod);
  assert_eq!(fetched.department_id.as_deref(), Some("D005"));
  assert_eq!(fetched.faculty_id.as_deref(), Some("F1"));
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_subjects_filters_by_role_and_department() {
  let s = store().await;
  student(&s, "D005").await;
  student(&s, "D005").await;
  student(&s, "D006").await;
  s.add_subject(NewSubject::new("Lin", Role::Lecturer).in_department("D005"))
    .await
    .unwrap();

  let all = s.list_subjects(&SubjectFilter::default()).await.unwrap();
  assert_eq!(all.len(), 4);

  let filter = SubjectFilter {
    role:          Some(Role::Student),
    department_id: Some("D005".into()),
  };
  let d5 = s.list_subjects(&filter).await.unwrap();
  assert_eq!(d5.len(), 2);
  assert!(d5.iter().all(|x| x.role == Role::Student));
}

#[tokio::test]
async fn update_subject_applies_only_given_fields() {
  let s = store().await;
  let id = student(&s, "D1").await;

  let patch = SubjectPatch { role: None, status: Some(SubjectStatus::Inactive) };
  let updated = s.update_subject(id, patch).await.unwrap().unwrap();
  assert_eq!(updated.role, Role::Student);
  assert_eq!(updated.status, SubjectStatus::Inactive);

  let missing = s
    .update_subject(Uuid::new_v4(), SubjectPatch { role: Some(Role::Admin), status: None })
    .await
    .unwrap();
  assert!(missing.is_none());
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn token_hash_resolves_to_subject() {
  let s = store().await;
  let id = student(&s, "D1").await;
  s.issue_token(id, "abc123".into()).await.unwrap();

  assert_eq!(s.resolve_token("abc123").await.unwrap(), Some(id));
  assert_eq!(s.resolve_token("nope").await.unwrap(), None);
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_active_assignment_per_student_and_role() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let lec_a = staff(&s, Role::Lecturer).await;
  let lec_b = staff(&s, Role::Lecturer).await;
  let sup = staff(&s, Role::Supervisor).await;

  let first = s
    .add_assignment(NewAssignment {
      student_id:    stu,
      reviewer_id:   lec_a,
      reviewer_role: ReviewerRole::Lecturer,
    })
    .await
    .unwrap()
    .expect("first assignment");

  let clash = s
    .add_assignment(NewAssignment {
      student_id:    stu,
      reviewer_id:   lec_b,
      reviewer_role: ReviewerRole::Lecturer,
    })
    .await
    .unwrap();
  assert!(clash.is_none());

  // A different reviewer role is independent.
  assert!(
    s.add_assignment(NewAssignment {
      student_id:    stu,
      reviewer_id:   sup,
      reviewer_role: ReviewerRole::Supervisor,
    })
    .await
    .unwrap()
    .is_some()
  );

  // After deactivation the slot frees up.
  let gone = s.deactivate_assignment(first.assignment_id).await.unwrap().unwrap();
  assert!(!gone.is_active);
  assert!(
    s.list_active_assignments(lec_a, ReviewerRole::Lecturer)
      .await
      .unwrap()
      .is_empty()
  );
  assert!(
    s.add_assignment(NewAssignment {
      student_id:    stu,
      reviewer_id:   lec_b,
      reviewer_role: ReviewerRole::Lecturer,
    })
    .await
    .unwrap()
    .is_some()
  );
  assert_eq!(
    s.list_active_assignments(lec_b, ReviewerRole::Lecturer).await.unwrap(),
    vec![stu]
  );
}

#[tokio::test]
async fn deactivate_missing_assignment_returns_none() {
  let s = store().await;
  assert!(s.deactivate_assignment(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Artifacts ───────────────────────────────────────────────────────────────

async fn new_task(s: &SqliteStore, student_id: Uuid, title: &str) -> Uuid {
  s.create_artifact(NewArtifact {
    student_id,
    status: ArtifactStatus::Pending,
    body: task(title),
  })
  .await
  .unwrap()
  .artifact_id
}

#[tokio::test]
async fn artifact_round_trips_through_storage() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let id = new_task(&s, stu, "Rack the switches").await;

  let item = s.get_artifact(ArtifactKind::Task, id).await.unwrap().unwrap();
  assert_eq!(item.body, task("Rack the switches"));
  assert_eq!(item.status, ArtifactStatus::Pending);
  assert!(item.reviewer_comments.is_empty());
  assert!(item.reviewed_by.is_none());

  // Looking the id up under another kind finds nothing.
  assert!(s.get_artifact(ArtifactKind::Report, id).await.unwrap().is_none());
}

#[tokio::test]
async fn status_change_is_compare_and_swap() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let lecturer = staff(&s, Role::Lecturer).await;
  let id = new_task(&s, stu, "t").await;

  let approve = |expected| StatusChange {
    kind: ArtifactKind::Task,
    artifact_id: id,
    expected,
    new_status: ArtifactStatus::Approved,
    actor_id: lecturer,
    actor_role: Role::Lecturer,
    comments: Some("Good".into()),
  };

  let done = s.update_artifact_status(approve(ArtifactStatus::Pending)).await.unwrap().unwrap();
  assert_eq!(done.status, ArtifactStatus::Approved);
  assert_eq!(done.reviewed_by, Some(lecturer));
  assert_eq!(done.reviewer_comments.get(&Role::Lecturer).map(String::as_str), Some("Good"));

  // A second writer that saw PENDING loses.
  let lost = s.update_artifact_status(approve(ArtifactStatus::Pending)).await.unwrap();
  assert!(lost.is_none());
}

#[tokio::test]
async fn comments_from_different_roles_accumulate() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let id = new_task(&s, stu, "t").await;

  // A submit carries no comment and records no reviewer.
  let submitted = s
    .update_artifact_status(StatusChange {
      kind:        ArtifactKind::Task,
      artifact_id: id,
      expected:    ArtifactStatus::Pending,
      new_status:  ArtifactStatus::Submitted,
      actor_id:    stu,
      actor_role:  Role::Student,
      comments:    None,
    })
    .await
    .unwrap()
    .unwrap();
  assert!(submitted.reviewed_by.is_none());
  assert!(submitted.reviewer_comments.is_empty());

  let supervisor = staff(&s, Role::Supervisor).await;
  let rejected = s
    .update_artifact_status(StatusChange {
      kind:        ArtifactKind::Task,
      artifact_id: id,
      expected:    ArtifactStatus::Submitted,
      new_status:  ArtifactStatus::Rejected,
      actor_id:    supervisor,
      actor_role:  Role::Supervisor,
      comments:    Some("Incomplete".into()),
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(rejected.reviewed_by, Some(supervisor));
  assert_eq!(
    rejected.reviewer_comments,
    BTreeMap::from([(Role::Supervisor, "Incomplete".to_string())])
  );
}

#[tokio::test]
async fn body_update_and_delete_require_expected_status() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let id = new_task(&s, stu, "before").await;

  let stale = s
    .update_artifact_body(id, ArtifactStatus::Submitted, task("after"))
    .await
    .unwrap();
  assert!(stale.is_none());

  let updated = s
    .update_artifact_body(id, ArtifactStatus::Pending, task("after"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.body, task("after"));

  assert!(
    !s.delete_artifact(ArtifactKind::Task, id, ArtifactStatus::Approved)
      .await
      .unwrap()
  );
  assert!(
    s.delete_artifact(ArtifactKind::Task, id, ArtifactStatus::Pending)
      .await
      .unwrap()
  );
  assert!(s.get_artifact(ArtifactKind::Task, id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_artifacts_filters_by_owner_and_status() {
  let s = store().await;
  let a = student(&s, "D1").await;
  let b = student(&s, "D1").await;
  let first = new_task(&s, a, "a1").await;
  let second = new_task(&s, a, "a2").await;
  new_task(&s, b, "b1").await;

  let mine = s
    .list_artifacts(ArtifactKind::Task, &ArtifactFilter {
      student_ids: Some(vec![a]),
      status:      None,
    })
    .await
    .unwrap();
  // Newest first.
  assert_eq!(
    mine.iter().map(|i| i.artifact_id).collect::<Vec<_>>(),
    vec![second, first]
  );

  let all = s.list_artifacts(ArtifactKind::Task, &ArtifactFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let none = s
    .list_artifacts(ArtifactKind::Task, &ArtifactFilter {
      student_ids: Some(vec![]),
      status:      None,
    })
    .await
    .unwrap();
  assert!(none.is_empty());

  let approved = s
    .list_artifacts(ArtifactKind::Task, &ArtifactFilter {
      student_ids: None,
      status:      Some(ArtifactStatus::Approved),
    })
    .await
    .unwrap();
  assert!(approved.is_empty());

  let reports = s.list_artifacts(ArtifactKind::Report, &ArtifactFilter::default()).await.unwrap();
  assert!(reports.is_empty());
}

#[tokio::test]
async fn listings_accept_scopes_beyond_the_variable_limit() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let item = new_task(&s, stu, "a1").await;

  // More ids than SQLite allows bound variables in one statement.
  let mut ids: Vec<Uuid> = (0..40_000).map(|_| Uuid::new_v4()).collect();
  ids.push(stu);

  let found = s
    .list_artifacts(ArtifactKind::Task, &ArtifactFilter {
      student_ids: Some(ids.clone()),
      status:      Some(ArtifactStatus::Pending),
    })
    .await
    .unwrap();
  assert_eq!(found.iter().map(|i| i.artifact_id).collect::<Vec<_>>(), vec![item]);

  assert!(s.list_evaluations(Some(&ids[..])).await.unwrap().is_empty());
  assert!(s.list_checkins(Some(&ids[..])).await.unwrap().is_empty());
}

// ─── Evaluations ─────────────────────────────────────────────────────────────

fn record(student_id: Uuid, evaluator_id: Uuid, scores: &[(&str, u8)]) -> EvaluationRecord {
  EvaluationRecord {
    student_id,
    evaluator_id,
    evaluator_role: ReviewerRole::Supervisor,
    date: day(10),
    scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    overall_comments: Some("steady".into()),
  }
}

async fn score_rows(s: &SqliteStore) -> i64 {
  s.conn
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM evaluation_scores", [], |row| row.get(0))?)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn evaluation_upsert_replaces_scores() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let sup = staff(&s, Role::Supervisor).await;

  let (first, outcome) = s
    .upsert_evaluation(record(stu, sup, &[("punctuality", 4), ("teamwork", 5)]))
    .await
    .unwrap();
  assert_eq!(outcome, UpsertOutcome::Created);
  assert_eq!(first.scores.len(), 2);

  let (second, outcome) = s
    .upsert_evaluation(record(stu, sup, &[("initiative", 3)]))
    .await
    .unwrap();
  assert_eq!(outcome, UpsertOutcome::Updated);
  assert_eq!(second.evaluation_id, first.evaluation_id);
  assert_eq!(second.scores, BTreeMap::from([("initiative".to_string(), 3)]));

  // One record, and no orphaned scores from the first write.
  let all = s.list_evaluations(None).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(score_rows(&s).await, 1);
}

#[tokio::test]
async fn evaluations_are_keyed_per_evaluator() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  let other = student(&s, "D1").await;

  let sup = staff(&s, Role::Supervisor).await;
  let lec = staff(&s, Role::Lecturer).await;

  s.upsert_evaluation(record(stu, sup, &[("x", 1)])).await.unwrap();
  s.upsert_evaluation(record(stu, lec, &[("x", 2)])).await.unwrap();
  s.upsert_evaluation(record(other, sup, &[("x", 3)])).await.unwrap();

  assert_eq!(s.list_evaluations(Some(&[stu][..])).await.unwrap().len(), 2);
  assert_eq!(s.list_evaluations(Some(&[][..])).await.unwrap().len(), 0);
  assert_eq!(s.list_evaluations(None).await.unwrap().len(), 3);
}

// ─── Check-ins ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkin_review_is_compare_and_swap() {
  let s = store().await;
  let stu = student(&s, "D1").await;

  let checkin = s
    .create_checkin(NewCheckIn {
      student_id:       stu,
      location:         Some(GeoPoint { latitude: 6.5, longitude: 3.4 }),
      gps_verified:     true,
      outside_geofence: false,
      manual_reason:    None,
      photo_ref:        None,
    })
    .await
    .unwrap();
  assert_eq!(checkin.supervisor_status, CheckInStatus::Pending);

  let fetched = s.get_checkin(checkin.checkin_id).await.unwrap().unwrap();
  assert_eq!(fetched.location, Some(GeoPoint { latitude: 6.5, longitude: 3.4 }));
  assert!(fetched.gps_verified);

  let review = |new_status| CheckInReview {
    checkin_id: checkin.checkin_id,
    expected: CheckInStatus::Pending,
    new_status,
    comments: Some("seen on site".into()),
  };
  let verified = s
    .update_checkin_status(review(CheckInStatus::Verified))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(verified.supervisor_status, CheckInStatus::Verified);
  assert_eq!(verified.supervisor_comments.as_deref(), Some("seen on site"));

  assert!(
    s.update_checkin_status(review(CheckInStatus::Flagged))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn manual_checkin_keeps_reason_without_location() {
  let s = store().await;
  let stu = student(&s, "D1").await;
  s.create_checkin(NewCheckIn {
    student_id:       stu,
    location:         None,
    gps_verified:     false,
    outside_geofence: false,
    manual_reason:    Some("GPS denied".into()),
    photo_ref:        None,
  })
  .await
  .unwrap();

  let list = s.list_checkins(Some(&[stu][..])).await.unwrap();
  assert_eq!(list.len(), 1);
  assert!(list[0].location.is_none());
  assert_eq!(list[0].manual_reason.as_deref(), Some("GPS denied"));
  assert!(s.list_checkins(Some(&[Uuid::new_v4()][..])).await.unwrap().is_empty());
}
