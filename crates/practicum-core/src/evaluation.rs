//! Evaluations: periodic scorecards written by a lecturer or supervisor.
//!
//! An evaluation has no approval phase. It is keyed by
//! `(student_id, evaluator_id, date)`: writing the same key again replaces the
//! previous scorecard in place.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, subject::ReviewerRole};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
  pub evaluation_id:    Uuid,
  pub student_id:       Uuid,
  pub evaluator_id:     Uuid,
  pub evaluator_role:   ReviewerRole,
  pub date:             NaiveDate,
  /// Metric key → score in `MIN_SCORE..=MAX_SCORE`.
  pub scores:           BTreeMap<String, u8>,
  pub overall_comments: Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// The scorecard as submitted by an evaluator; the evaluator identity is
/// taken from the authenticated actor, never from the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationInput {
  pub student_id:       Uuid,
  pub date:             NaiveDate,
  pub scores:           BTreeMap<String, u8>,
  pub overall_comments: Option<String>,
}

impl EvaluationInput {
  pub fn validate(&self) -> Result<()> {
    if self.scores.is_empty() {
      return Err(Error::Validation("at least one score is required".into()));
    }
    for (metric, score) in &self.scores {
      if metric.trim().is_empty() {
        return Err(Error::Validation("metric keys must not be empty".into()));
      }
      if !(MIN_SCORE..=MAX_SCORE).contains(score) {
        return Err(Error::Validation(format!(
          "score for {metric:?} must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
        )));
      }
    }
    Ok(())
  }
}

/// Input to [`crate::store::PortalStore::upsert_evaluation`].
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
  pub student_id:       Uuid,
  pub evaluator_id:     Uuid,
  pub evaluator_role:   ReviewerRole,
  pub date:             NaiveDate,
  pub scores:           BTreeMap<String, u8>,
  pub overall_comments: Option<String>,
}

/// Whether an upsert inserted a new scorecard or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Created,
  Updated,
}
