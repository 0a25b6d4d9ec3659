//! JSON REST API for Practicum.
//!
//! Exposes an axum [`Router`] over a [`Portal`] backed by any store that
//! implements both [`PortalStore`] and [`IdentityProvider`]. Every route
//! requires `Authorization: Bearer <token>`.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use practicum_core::{
  Portal, PortalConfig,
  store::{IdentityProvider, PortalStore},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{artifacts, checkins, directory, evaluations};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PRACTICUM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  #[serde(default = "default_geofence_radius")]
  pub geofence_radius_m: f64,
}

fn default_geofence_radius() -> f64 { PortalConfig::default().geofence_radius_m }

impl ServerConfig {
  pub fn portal_config(&self) -> PortalConfig {
    PortalConfig { geofence_radius_m: self.geofence_radius_m }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the HTTP layer needs from a storage backend.
pub trait Backend: PortalStore + IdentityProvider + Clone + Send + Sync + 'static {}

impl<T> Backend for T where T: PortalStore + IdentityProvider + Clone + Send + Sync + 'static {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub portal: Arc<Portal<S>>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
    Self { portal: Arc::new(Portal::new(store, config.portal_config())) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: Backend,
{
  Router::new()
    .route("/me", get(directory::me))
    // Artifacts
    .route(
      "/artifacts/{kind}",
      get(artifacts::list::<S>).post(artifacts::create::<S>),
    )
    .route(
      "/artifacts/{kind}/{id}",
      get(artifacts::get_one::<S>)
        .put(artifacts::update::<S>)
        .delete(artifacts::delete::<S>),
    )
    .route("/artifacts/{kind}/{id}/submit", post(artifacts::submit::<S>))
    .route("/artifacts/{kind}/{id}/status", patch(artifacts::review::<S>))
    // Evaluations
    .route(
      "/evaluations",
      put(evaluations::upsert::<S>).get(evaluations::list::<S>),
    )
    // Check-ins
    .route("/checkins", post(checkins::record::<S>).get(checkins::list::<S>))
    .route("/checkins/{id}/status", patch(checkins::review::<S>))
    // Directory
    .route(
      "/subjects",
      get(directory::list_subjects::<S>).post(directory::create_subject::<S>),
    )
    .route("/subjects/{id}", patch(directory::update_subject::<S>))
    .route("/assignments", post(directory::create_assignment::<S>))
    .route(
      "/assignments/{id}",
      axum::routing::delete(directory::deactivate_assignment::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
