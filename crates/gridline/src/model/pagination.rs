//! Pagination window.
//!
//! Converts a page number and page size into a half-open index range over a
//! row batch, and answers the page-count, has-next and has-prev questions a
//! pager collaborator asks.
//!
//! The window accepts any page the caller asks for. Bounds are clamped to
//! `[0, item_count]`, so a stale "go to page 9" after the data shrank yields an
//! empty slice instead of an error. Clamping the page number itself into the
//! valid range is a presentation concern, offered separately by
//! [`PaginationWindow::page_to_clamped`].
//!
//! # Example
//!
//! ```
//! use gridline::model::{PageRequest, PaginationWindow};
//!
//! let window = PaginationWindow::new(PageRequest::new(1, 5));
//! window.set_item_count(11);
//!
//! window.page_changed.connect(|changed| {
//!     println!("page {} shows rows {:?}", changed.page, changed.bounds.range());
//! });
//!
//! let changed = window.page_to(3);
//! assert_eq!(changed.bounds.range(), 10..11);
//! assert_eq!(window.page_count(), 3);
//! assert!(!window.has_next());
//! ```

use std::ops::Range;

use gridline_core::logging::targets;
use gridline_core::{GridError, Property, Result, Signal};
use serde::{Deserialize, Serialize};

/// Page shown when none is requested.
pub const DEFAULT_PAGE: usize = 1;

/// Rows per page when no size is requested.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A request to show a given page at a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: usize,
    /// Rows per page.
    pub size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a request, clamping a zero page or size up to 1.
    pub fn new(page: usize, size: usize) -> Self {
        match Self::try_new(page, size) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(target: targets::PAGINATION, %err, "clamping page request");
                Self {
                    page: page.max(1),
                    size: size.max(1),
                }
            }
        }
    }

    /// Creates a request, rejecting a zero page or size.
    pub fn try_new(page: usize, size: usize) -> Result<Self> {
        if page == 0 || size == 0 {
            return Err(GridError::InvalidPageRequest { page, size });
        }
        Ok(Self { page, size })
    }

    /// The same request with a zero page or size clamped up to 1.
    pub fn normalized(self) -> Self {
        Self::new(self.page, self.size)
    }

    /// The index range this request covers in a batch of `item_count` rows.
    pub fn bounds(&self, item_count: usize) -> Bounds {
        page_bounds(self.page, self.size, item_count)
    }
}

/// A half-open index range `start..end` into a row batch, with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    start: usize,
    end: usize,
}

impl Bounds {
    /// Creates bounds; a reversed pair collapses to an empty range at `end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end,
        }
    }

    /// First index, inclusive.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last index, exclusive.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of indices covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if no index is covered.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The bounds as a `Range`.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The bounds clamped to `[0, item_count]`.
    pub fn clamp_to(&self, item_count: usize) -> Self {
        Self::new(self.start.min(item_count), self.end.min(item_count))
    }

    /// Slices `items`, clamping to its length first.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let clamped = self.clamp_to(items.len());
        &items[clamped.range()]
    }
}

/// Number of pages needed for `item_count` rows, `ceil(item_count / size)`.
///
/// A zero size yields zero pages.
pub fn page_count(item_count: usize, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    item_count.div_ceil(size)
}

/// Bounds of `page` at `size` over `item_count` rows.
///
/// `[(page - 1) * size, page * size]`, clamped to `[0, item_count]`. Never
/// panics, including for page 0 and pages past the end.
pub fn page_bounds(page: usize, size: usize, item_count: usize) -> Bounds {
    let start = page.saturating_sub(1).saturating_mul(size);
    let end = page.saturating_mul(size);
    Bounds::new(start.min(item_count), end.min(item_count))
}

/// Emitted on every page request, including redundant ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageChanged {
    /// The requested page.
    pub page: usize,
    /// Rows per page.
    pub size: usize,
    /// Index range of the page in the current batch.
    pub bounds: Bounds,
}

/// Page state plus the `page_changed` channel.
///
/// # Signals
///
/// - `page_changed`: Emitted by every `page_to*` call with the resulting page
///   and bounds. Consumers that want to skip redundant renders compare
///   `bounds` themselves.
pub struct PaginationWindow {
    item_count: Property<usize>,
    page: Property<usize>,
    size: Property<usize>,

    /// Emitted on every page request.
    pub page_changed: Signal<PageChanged>,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(PageRequest::default())
    }
}

impl PaginationWindow {
    /// Creates a window over an empty batch.
    pub fn new(request: PageRequest) -> Self {
        let request = request.normalized();
        Self {
            item_count: Property::new(0),
            page: Property::new(request.page),
            size: Property::new(request.size),
            page_changed: Signal::new(),
        }
    }

    /// Number of rows in the current batch.
    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    /// Updates the row count. Returns `true` if it changed.
    ///
    /// Does not emit; the page number is kept even if it is now out of range.
    pub fn set_item_count(&self, item_count: usize) -> bool {
        self.item_count.set(item_count)
    }

    /// The current page.
    pub fn page(&self) -> usize {
        self.page.get()
    }

    /// Rows per page.
    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Sets the page size, clamping zero up to 1. Does not emit.
    pub fn set_size(&self, size: usize) -> bool {
        self.size.set(size.max(1))
    }

    /// The current page request.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page(),
            size: self.size(),
        }
    }

    /// `ceil(item_count / size)`.
    pub fn page_count(&self) -> usize {
        page_count(self.item_count(), self.size())
    }

    /// Returns `true` if a page follows the current one.
    pub fn has_next(&self) -> bool {
        self.page() < self.page_count()
    }

    /// Returns `true` if a page precedes the current one.
    pub fn has_prev(&self) -> bool {
        self.page() > 1
    }

    /// Returns `true` if `page` is the current page.
    pub fn is_current_page(&self, page: usize) -> bool {
        self.page() == page
    }

    /// All page numbers, `1..=page_count`.
    pub fn page_list(&self) -> Vec<usize> {
        (1..=self.page_count()).collect()
    }

    /// Bounds of the current page.
    pub fn bounds(&self) -> Bounds {
        self.request().bounds(self.item_count())
    }

    /// The current page, size and bounds.
    pub fn current(&self) -> PageChanged {
        PageChanged {
            page: self.page(),
            size: self.size(),
            bounds: self.bounds(),
        }
    }

    /// Moves to `page` and emits `page_changed`.
    ///
    /// Page 0 is clamped to 1; pages past the end are accepted and produce
    /// empty bounds.
    pub fn page_to(&self, page: usize) -> PageChanged {
        let request = PageRequest::new(page, self.size());
        self.page.set(request.page);
        let changed = self.current();
        tracing::trace!(
            target: targets::PAGINATION,
            page = changed.page,
            size = changed.size,
            start = changed.bounds.start(),
            end = changed.bounds.end(),
            "page requested"
        );
        self.page_changed.emit(changed);
        changed
    }

    /// Applies a full request: size first, then page.
    pub fn apply(&self, request: PageRequest) -> PageChanged {
        let request = request.normalized();
        self.set_size(request.size);
        self.page_to(request.page)
    }

    /// Moves to `page` clamped into `[1, max(1, page_count)]`.
    pub fn page_to_clamped(&self, page: usize) -> PageChanged {
        let last = self.page_count().max(1);
        self.page_to(page.clamp(1, last))
    }

    /// Moves to the next page.
    pub fn page_next(&self) -> PageChanged {
        self.page_to(self.page().saturating_add(1))
    }

    /// Moves to the previous page; stays on page 1 at the start.
    pub fn page_prev(&self) -> PageChanged {
        self.page_to(self.page().saturating_sub(1))
    }
}

static_assertions::assert_impl_all!(PaginationWindow: Send, Sync);
