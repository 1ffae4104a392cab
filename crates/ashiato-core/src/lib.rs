//! Core types and services for Ashiato, a geotagged pin board.
//!
//! This crate holds the visibility resolver, the location-integrity gate,
//! the friendship oracle and pin comments. It has no HTTP or database
//! dependencies; storage is reached through the traits in [`store`].

pub mod comment;
pub mod engine;
pub mod error;
pub mod friendship;
pub mod gate;
pub mod geo;
pub mod oracle;
pub mod pin;
pub mod posting;
pub mod store;
pub mod user;
pub mod visibility;

use chrono::{DateTime, SubsecRound, Utc};

pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};

/// The current time at the microsecond precision stores persist.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }
