//! Core types and pure computations for netflow-viz.
//!
//! Holds the byte-unit parser, the flow/connection data model, the circular
//! layout that turns aggregated connections into drawable primitives, plus the
//! shared error type, formatting helpers, timestamp utilities and CLI settings.

pub mod byte_units;
pub mod error;
pub mod formatting;
pub mod layout;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{NetflowError, Result};
