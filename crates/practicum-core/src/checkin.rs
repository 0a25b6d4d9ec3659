//! Attendance check-ins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::geofence::GeoPoint;

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
pub enum CheckInStatus {
  #[default]
  Pending,
  Verified,
  Flagged,
}

/// A single check-in event. Created once, mutated only by the assigned
/// supervisor, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
  pub checkin_id:          Uuid,
  pub student_id:          Uuid,
  pub recorded_at:         DateTime<Utc>,
  pub location:            Option<GeoPoint>,
  pub gps_verified:        bool,
  pub outside_geofence:    bool,
  pub manual_reason:       Option<String>,
  pub photo_ref:           Option<String>,
  pub supervisor_status:   CheckInStatus,
  pub supervisor_comments: Option<String>,
  pub updated_at:          DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_checkin`].
#[derive(Debug, Clone)]
pub struct NewCheckIn {
  pub student_id:       Uuid,
  pub location:         Option<GeoPoint>,
  pub gps_verified:     bool,
  pub outside_geofence: bool,
  pub manual_reason:    Option<String>,
  pub photo_ref:        Option<String>,
}

/// A conditional supervisor verdict; applied only while the stored status is
/// still `expected`.
#[derive(Debug, Clone)]
pub struct CheckInReview {
  pub checkin_id: Uuid,
  pub expected:   CheckInStatus,
  pub new_status: CheckInStatus,
  pub comments:   Option<String>,
}
