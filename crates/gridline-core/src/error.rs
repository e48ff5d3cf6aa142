//! Error types for gridline.
//!
//! None of these are fatal to a running grid. Upstream failures are logged
//! and the last good projection is kept, malformed rows are dropped from
//! their batch, and invalid page requests are clamped.

/// Result type alias for gridline operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors produced or absorbed by the grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The row stream reported a failure instead of a batch.
    #[error("Upstream row stream failed: {message}")]
    UpstreamData { message: String },

    /// A row could not be used because it lacks a usable identifier.
    #[error("Malformed row at position {index}: {reason}")]
    MalformedRow { index: usize, reason: String },

    /// A page request with a zero page number or page size.
    #[error("Invalid page request: page {page}, size {size} (both must be at least 1)")]
    InvalidPageRequest { page: usize, size: usize },

    /// Configuration could not be parsed.
    #[error("Invalid grid configuration: {0}")]
    Config(String),
}

impl GridError {
    /// Create an upstream data error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamData {
            message: message.into(),
        }
    }

    /// Create a malformed row error.
    pub fn malformed_row(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            index,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
