//! Row model and the pure grid components.
//!
//! The grid engine is assembled from four leaf components plus the row types
//! they operate on. Each one is usable on its own; [`crate::GridController`]
//! wires them together against live inputs.
//!
//! # Core Types
//!
//! - `Row`: a typed identifier plus an ordered field map
//! - `RowBatch`: one complete, shared snapshot of rows
//! - `AnnotatedRow`: a row with its 1-based ordinal in the batch
//!
//! # Components
//!
//! - `derive_columns`: ordered display columns of a batch
//! - `index_rows`: ordinals for the full, pre-pagination batch
//! - `PaginationWindow`: page number and size to index bounds
//! - `SelectionStateMachine`: selection policy per mode, plus the rendered controls
//!
//! # Architecture Overview
//!
//! ```text
//! RowBatch ──┬──> derive_columns ─────────────────────┐
//!            └──> index_rows ──> Bounds::slice ───────┼──> projection
//! PageRequest ──> PaginationWindow ──> Bounds ─┘       │
//!                                                     └──> visible ids
//! ToggleInput ──> SelectionStateMachine <── visible ids
//!                        │
//!                        └──> SelectionChanged, ControlSet
//! ```

mod columns;
mod indexer;
mod pagination;
mod row;
mod selection;

pub use columns::derive_columns;
pub use indexer::{AnnotatedRow, index_rows};
pub use pagination::{
    Bounds, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PageChanged, PageRequest, PaginationWindow,
    page_bounds, page_count,
};
pub use row::{ID_KEY, ROW_NUMBER_KEY, Row, RowBatch, RowId};
pub use selection::{
    ControlSet, SelectionChanged, SelectionMode, SelectionState, SelectionStateMachine,
    SelectorKind, ToggleInput,
};
