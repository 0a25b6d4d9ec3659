//! Core types, store traits and the review engine for Practicum.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! engine is split into small pure parts ([`capability`], [`guard`],
//! [`workflow`], [`geofence`]) and one orchestrator, [`portal::Portal`], which
//! drives them against a [`store::PortalStore`].

pub mod artifact;
pub mod assignment;
pub mod capability;
pub mod checkin;
pub mod error;
pub mod evaluation;
pub mod geofence;
pub mod guard;
pub mod portal;
pub mod resolver;
pub mod store;
pub mod subject;
pub mod workflow;

pub use error::{Error, Result};
pub use portal::{Portal, PortalConfig};
