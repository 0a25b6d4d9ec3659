//! SQL schema for the Practicum SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Subjects are never deleted; deactivation is a status change.
CREATE TABLE IF NOT EXISTS subjects (
    subject_id          TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    role                TEXT NOT NULL,   -- STUDENT | LECTURER | SUPERVISOR | HOD | ADMIN
    faculty_id          TEXT,
    department_id       TEXT,
    company_affiliation TEXT,
    status              TEXT NOT NULL DEFAULT 'ACTIVE',
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS access_tokens (
    token_hash  TEXT PRIMARY KEY,     -- hex SHA-256 of the bearer token
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id TEXT PRIMARY KEY,
    student_id    TEXT NOT NULL REFERENCES subjects(subject_id),
    reviewer_id   TEXT NOT NULL REFERENCES subjects(subject_id),
    reviewer_role TEXT NOT NULL,      -- LECTURER | SUPERVISOR
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

-- At most one active reviewer per role per student.
CREATE UNIQUE INDEX IF NOT EXISTS assignments_one_active_idx
    ON assignments(student_id, reviewer_role) WHERE is_active = 1;

-- Tasks, reports and placements.
CREATE TABLE IF NOT EXISTS artifacts (
    artifact_id       TEXT PRIMARY KEY,
    kind              TEXT NOT NULL,  -- task | report | placement
    student_id        TEXT NOT NULL REFERENCES subjects(subject_id),
    status            TEXT NOT NULL,
    body_json         TEXT NOT NULL,  -- JSON payload (inner data only)
    reviewer_comments TEXT NOT NULL DEFAULT '{}',
    reviewed_by       TEXT REFERENCES subjects(subject_id),
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluations (
    evaluation_id    TEXT PRIMARY KEY,
    student_id       TEXT NOT NULL REFERENCES subjects(subject_id),
    evaluator_id     TEXT NOT NULL REFERENCES subjects(subject_id),
    evaluator_role   TEXT NOT NULL,
    date             TEXT NOT NULL,   -- YYYY-MM-DD
    overall_comments TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (student_id, evaluator_id, date)
);

CREATE TABLE IF NOT EXISTS evaluation_scores (
    evaluation_id TEXT NOT NULL REFERENCES evaluations(evaluation_id) ON DELETE CASCADE,
    metric_key    TEXT NOT NULL,
    score         INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
    PRIMARY KEY (evaluation_id, metric_key)
);

CREATE TABLE IF NOT EXISTS checkins (
    checkin_id          TEXT PRIMARY KEY,
    student_id          TEXT NOT NULL REFERENCES subjects(subject_id),
    recorded_at         TEXT NOT NULL,
    latitude            REAL,
    longitude           REAL,
    gps_verified        INTEGER NOT NULL,
    outside_geofence    INTEGER NOT NULL,
    manual_reason       TEXT,
    photo_ref           TEXT,
    supervisor_status   TEXT NOT NULL DEFAULT 'PENDING',
    supervisor_comments TEXT,
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subjects_department_idx ON subjects(department_id, role);
CREATE INDEX IF NOT EXISTS assignments_reviewer_idx ON assignments(reviewer_id, reviewer_role);
CREATE INDEX IF NOT EXISTS artifacts_student_idx    ON artifacts(kind, student_id);
CREATE INDEX IF NOT EXISTS evaluations_student_idx  ON evaluations(student_id);
CREATE INDEX IF NOT EXISTS checkins_student_idx     ON checkins(student_id);

PRAGMA user_version = 1;
";
