//! Library side of the survey consolidation CLI: configuration, logging and
//! the per-mode pipeline, kept here so integration tests can drive them.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
