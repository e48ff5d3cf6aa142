//! Core plumbing for gridline.
//!
//! This crate provides the small, generic building blocks the grid engine is
//! assembled from:
//!
//! - **Signal/Slot System**: synchronous, ordered publish-subscribe channels
//!   with explicit close-on-teardown
//! - **Property System**: change-detecting value cells
//! - **Latest-value joins**: [`CombineLatest`] for pairing the freshest values
//!   of two inputs
//! - **Errors**: the [`GridError`] taxonomy
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Example
//!
//! ```
//! use gridline_core::{Property, Signal};
//!
//! let bounds = Property::new((0usize, 5usize));
//! let bounds_changed = Signal::<(usize, usize)>::new();
//!
//! bounds_changed.connect(|(start, end)| {
//!     println!("Showing rows {start}..{end}");
//! });
//!
//! if bounds.set((5, 10)) {
//!     bounds_changed.emit((5, 10));
//! }
//!
//! // Teardown: nothing fires after close.
//! bounds_changed.close();
//! bounds_changed.emit((10, 15));
//! ```

pub mod combine;
mod error;
pub mod logging;
pub mod property;
pub mod signal;

pub use combine::CombineLatest;
pub use error::{GridError, Result};
pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal, SignalEmitter};
