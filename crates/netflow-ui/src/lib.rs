//! Terminal UI layer for the netflow dashboard.
//!
//! Provides themes, the header, slider and date-range components, the graph
//! and table views, figure export and the main application event loop built
//! on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod export;
pub mod graph_view;
pub mod table_view;
pub mod themes;

pub use netflow_core as core;
