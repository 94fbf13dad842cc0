//! Run orchestration: configuration, per-line processing and the final render.

/// Run configuration loaded from JSON.
pub mod config;
/// The line-by-line pipeline and its run report.
pub mod run;
