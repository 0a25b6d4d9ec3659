//! Check-in location rules.
//!
//! The verifier only classifies a check-in; it never approves one. Final
//! verification is a supervisor action.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used by the haversine distance, in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

impl GeoPoint {
  pub fn validate(&self) -> Result<()> {
    if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
      return Err(Error::Validation(format!(
        "latitude out of range: {}",
        self.latitude
      )));
    }
    if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude)
    {
      return Err(Error::Validation(format!(
        "longitude out of range: {}",
        self.longitude
      )));
    }
    Ok(())
  }

  /// Great-circle distance in metres.
  pub fn distance_to(&self, other: &GeoPoint) -> f64 {
    let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (other.longitude - self.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
      + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
  }
}

/// A circle around a registered workplace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
  pub center:   GeoPoint,
  pub radius_m: f64,
}

impl Geofence {
  pub fn contains(&self, point: &GeoPoint) -> bool {
    self.center.distance_to(point) <= self.radius_m
  }
}

/// What the student's device reported.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckInClaim {
  /// Absent when GPS was denied or unavailable.
  pub location:         Option<GeoPoint>,
  /// Client-side verdict, consulted only when no workplace is registered.
  pub within_workplace: Option<bool>,
  pub reason:           Option<String>,
  /// Opaque reference to an uploaded photo.
  pub photo_ref:        Option<String>,
}

/// The verifier's classification of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
  pub gps_verified:     bool,
  pub outside_geofence: bool,
}

/// Classify a check-in claim against the student's workplace, if known.
pub fn verify(claim: &CheckInClaim, workplace: Option<&Geofence>) -> Result<Verification> {
  match &claim.location {
    Some(point) => {
      point.validate()?;
      let inside = match workplace {
        Some(fence) => fence.contains(point),
        None => claim.within_workplace.unwrap_or(false),
      };
      Ok(Verification {
        gps_verified:     inside,
        outside_geofence: !inside,
      })
    }
    None => {
      let has_reason = claim.reason.as_deref().is_some_and(|r| !r.trim().is_empty());
      let has_photo = claim.photo_ref.as_deref().is_some_and(|p| !p.trim().is_empty());
      if !has_reason && !has_photo {
        return Err(Error::Validation(
          "a manual check-in needs a reason or a photo".into(),
        ));
      }
      Ok(Verification {
        gps_verified:     false,
        outside_geofence: false,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn office() -> Geofence {
    Geofence {
      center:   GeoPoint { latitude: 6.5244, longitude: 3.3792 },
      radius_m: 200.0,
    }
  }

  fn claim_at(latitude: f64, longitude: f64) -> CheckInClaim {
    CheckInClaim {
      location: Some(GeoPoint { latitude, longitude }),
      ..Default::default()
    }
  }

  #[test]
  fn distance_is_roughly_right() {
    let a = GeoPoint { latitude: 0.0, longitude: 0.0 };
    let b = GeoPoint { latitude: 0.0, longitude: 1.0 };
    let d = a.distance_to(&b);
    assert!((d - 111_195.0).abs() < 100.0, "distance {d}");
  }

  #[test]
  fn inside_the_fence_is_gps_verified() {
    let v = verify(&claim_at(6.5245, 3.3793), Some(&office())).unwrap();
    assert_eq!(v, Verification { gps_verified: true, outside_geofence: false });
  }

  #[test]
  fn outside_the_fence_is_flagged_not_rejected() {
    let v = verify(&claim_at(6.60, 3.50), Some(&office())).unwrap();
    assert_eq!(v, Verification { gps_verified: false, outside_geofence: true });
  }

  #[test]
  fn declared_verdict_used_without_workplace() {
    let mut claim = claim_at(6.60, 3.50);
    claim.within_workplace = Some(true);
    let v = verify(&claim, None).unwrap();
    assert!(v.gps_verified);

    claim.within_workplace = None;
    let v = verify(&claim, None).unwrap();
    assert!(v.outside_geofence);
  }

  #[test]
  fn manual_check_in_needs_reason_or_photo() {
    let bare = CheckInClaim::default();
    assert!(matches!(verify(&bare, None), Err(Error::Validation(_))));

    let blank = CheckInClaim { reason: Some("  ".into()), ..Default::default() };
    assert!(verify(&blank, None).is_err());

    let with_reason = CheckInClaim {
      reason: Some("GPS permission denied".into()),
      ..Default::default()
    };
    let v = verify(&with_reason, Some(&office())).unwrap();
    assert_eq!(v, Verification { gps_verified: false, outside_geofence: false });

    let with_photo = CheckInClaim {
      photo_ref: Some("uploads/desk.jpg".into()),
      ..Default::default()
    };
    assert!(verify(&with_photo, None).is_ok());
  }

  #[test]
  fn impossible_coordinates_fail() {
    assert!(verify(&claim_at(91.0, 0.0), None).is_err());
    assert!(verify(&claim_at(0.0, -181.0), None).is_err());
  }
}
