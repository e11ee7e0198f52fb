//! CLI library components for cohort classification runs.

pub mod input;
pub mod logging;
pub mod render;
