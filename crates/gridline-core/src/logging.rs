//! Logging facilities for gridline.
//!
//! gridline uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("gridline=debug,gridline_core::signal=trace")
//!     .init();
//! ```
//!
//! Every log line carries one of the [`targets`] below, so each subsystem
//! can be filtered on its own.

/// Target names for log filtering.
pub mod targets {
    /// Core plumbing target.
    pub const CORE: &str = "gridline_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "gridline_core::signal";
    /// Row model and ingestion target.
    pub const ROWS: &str = "gridline::rows";
    /// Pagination window target.
    pub const PAGINATION: &str = "gridline::pagination";
    /// Selection state machine target.
    pub const SELECTION: &str = "gridline::selection";
    /// Grid controller target.
    pub const CONTROLLER: &str = "gridline::controller";
    /// Configuration target.
    pub const CONFIG: &str = "gridline::config";
    /// Performance spans target.
    pub const PERF: &str = "gridline::perf";
}

/// A guard that records how long an operation runs.
///
/// Creates an `info`-level span under [`targets::PERF`] that stays entered
/// until the guard is dropped.
///
/// ```ignore
/// let _span = PerfSpan::new("rebuild_projection");
/// // ... work ...
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "gridline::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
