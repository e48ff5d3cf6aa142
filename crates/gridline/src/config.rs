//! Grid configuration.
//!
//! Options are static for a grid instance. They can be built in code or
//! loaded from TOML; every key is optional.
//!
//! ```
//! use gridline::{GridConfig, SelectionMode};
//!
//! let config = GridConfig::from_toml_str(
//!     r#"
//!     select_mode = "single"
//!     show_row_number = true
//!     page_size = 10
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.select_mode, SelectionMode::Single);
//! assert_eq!(config.page, 1);
//! ```

use gridline_core::logging::targets;
use gridline_core::{GridError, Result};
use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PageRequest, SelectionMode, SelectorKind};

/// Static options of one grid instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Selection policy.
    pub select_mode: SelectionMode,
    /// Prepend the synthetic `#` column.
    pub show_row_number: bool,
    /// Render the column header row.
    pub show_header: bool,
    /// Render the pager.
    pub show_pager: bool,
    /// Rows per page.
    pub page_size: usize,
    /// Initial 1-based page.
    pub page: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            select_mode: SelectionMode::default(),
            show_row_number: false,
            show_header: false,
            show_pager: false,
            page_size: DEFAULT_PAGE_SIZE,
            page: DEFAULT_PAGE,
        }
    }
}

impl GridConfig {
    /// Parses a configuration from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| GridError::config(err.to_string()))?;
        tracing::debug!(target: targets::CONFIG, ?config, "loaded grid configuration");
        Ok(config)
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| GridError::config(err.to_string()))
    }

    /// Sets the selection mode.
    pub fn with_select_mode(mut self, mode: SelectionMode) -> Self {
        self.select_mode = mode;
        self
    }

    /// Shows or hides the `#` column.
    pub fn with_row_number(mut self, show: bool) -> Self {
        self.show_row_number = show;
        self
    }

    /// Shows or hides the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.show_header = show;
        self
    }

    /// Shows or hides the pager.
    pub fn with_pager(mut self, show: bool) -> Self {
        self.show_pager = show;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the initial page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Clamps a zero page or page size up to 1.
    pub fn normalized(mut self) -> Self {
        if self.page == 0 || self.page_size == 0 {
            tracing::debug!(
                target: targets::CONFIG,
                page = self.page,
                page_size = self.page_size,
                "clamping page settings"
            );
            self.page = self.page.max(1);
            self.page_size = self.page_size.max(1);
        }
        self
    }

    /// The first page request of a grid built from this configuration.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    /// The control kind for the configured mode.
    pub fn selector_kind(&self) -> SelectorKind {
        self.select_mode.selector_kind()
    }
}
