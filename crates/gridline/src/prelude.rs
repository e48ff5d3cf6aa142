//! Prelude module for gridline.
//!
//! ```ignore
//! use gridline::prelude::*;
//! ```

// ============================================================================
// Grid
// ============================================================================

pub use crate::{GridConfig, GridController, GridProjection, Phase, RowFeed};

// ============================================================================
// Rows and Pagination
// ============================================================================

pub use crate::model::{AnnotatedRow, Bounds, PageChanged, PageRequest, Row, RowBatch, RowId};

// ============================================================================
// Selection
// ============================================================================

pub use crate::model::{ControlSet, SelectionChanged, SelectionMode, SelectorKind, ToggleInput};

// ============================================================================
// Plumbing
// ============================================================================

pub use gridline_core::{ConnectionGuard, GridError, Signal};
