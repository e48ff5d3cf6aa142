//! gridline - a headless, paginated data grid with mode-aware row selection.
//!
//! This is the main crate. It re-exports the plumbing from `gridline-core`
//! and adds the grid engine on top:
//!
//! - [`model`]: rows, column derivation, row numbering, pagination and the
//!   selection state machine
//! - [`GridController`]: wires them to row, page and toggle streams and
//!   publishes a render-ready projection
//! - [`GridConfig`]: static per-grid options, loadable from TOML
//!
//! Rendering is left to the caller: subscribe to the controller's signals and
//! draw whatever the projection and control set describe.
//!
//! # Example
//!
//! ```
//! use gridline::prelude::*;
//!
//! let grid = GridController::<u32>::new(GridConfig::default().with_row_number(true));
//! grid.signals().projection_changed.connect(|projection| {
//!     for row in projection.rows() {
//!         println!("{} {}", row.display("#"), row.display("name"));
//!     }
//! });
//!
//! let batch = RowBatch::<u32>::from_json_str(
//!     r#"{"values": [{"id": 11, "name": "Dr Nice"}, {"id": 12, "name": "Narco"}]}"#,
//! )
//! .unwrap();
//! grid.push_rows(batch);
//! assert_eq!(grid.columns(), vec!["#", "name"]);
//! ```

pub use gridline_core::*;

mod config;
mod controller;
pub mod model;
pub mod prelude;

pub use config::GridConfig;
pub use controller::{GridController, GridProjection, GridSignals, Phase, RowFeed};
pub use model::{
    AnnotatedRow, Bounds, ControlSet, PageChanged, PageRequest, PaginationWindow, Row, RowBatch,
    RowId, SelectionChanged, SelectionMode, SelectionState, SelectionStateMachine, SelectorKind,
    ToggleInput,
};
