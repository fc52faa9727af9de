//! Data layer for the netflow dashboard.
//!
//! Loads flow-export CSV files (a single file, a directory tree or a URL),
//! aggregates host-group connections over a time window and runs the
//! recompute pipeline that feeds the figure.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use netflow_core as core;
