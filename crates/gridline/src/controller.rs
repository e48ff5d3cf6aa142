//! The grid controller.
//!
//! [`GridController`] orchestrates the row model, the pagination window and
//! the selection state machine against three inbound streams (row batches,
//! page requests and toggle input) and publishes three outbound ones.
//!
//! # Signals
//!
//! - `projection_changed`: the render-ready `(columns, visible rows)` pair.
//!   Published for every new batch and for page requests that move the
//!   bounds.
//! - `selection_changed`: a single id or an ordered id list. Only published
//!   on a genuine change of the selected set; never in none mode.
//! - `controls_changed`: the rebuilt per-row selection controls. Published
//!   while the controller is in [`Phase::Rebuilding`], so toggles the
//!   presentation layer echoes back while re-materializing its widgets are
//!   ignored.
//!
//! The pager's `page_changed` channel lives on [`GridController::pager`].
//!
//! # Ordering
//!
//! A rebuild publishes `controls_changed`, then `projection_changed`, then
//! `selection_changed` if the new batch dropped selected rows. Internal state
//! is never locked while a signal is emitted, so slots may call back into the
//! controller.
//!
//! # Example
//!
//! ```
//! use gridline::{GridConfig, GridController, Row, RowBatch, SelectionChanged, ToggleInput};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let grid = GridController::<u32>::new(GridConfig::default().with_row_number(true));
//!
//! let selected = Arc::new(Mutex::new(Vec::new()));
//! let selected_clone = selected.clone();
//! grid.signals().selection_changed.connect(move |change: &SelectionChanged<u32>| {
//!     selected_clone.lock().push(change.ids());
//! });
//!
//! grid.push_rows(RowBatch::from_iter(
//!     (1..=12).map(|id| Row::new(id).with_field("name", format!("row {id}"))),
//! ));
//! assert_eq!(grid.columns(), vec!["#", "name"]);
//! assert_eq!(grid.page_count(), 3);
//!
//! grid.toggle(ToggleInput::Checks(vec![true, false, true]));
//! assert_eq!(*selected.lock(), vec![vec![1, 3]]);
//!
//! grid.dispose();
//! grid.toggle(ToggleInput::Checks(vec![false; 5]));
//! assert_eq!(selected.lock().len(), 1);
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use gridline_core::logging::targets;
use gridline_core::{CombineLatest, ConnectionGuard, GridError, PerfSpan, Signal, SignalEmitter};
use parking_lot::Mutex;

use crate::config::GridConfig;
use crate::model::{
    AnnotatedRow, Bounds, ControlSet, PageChanged, PageRequest, PaginationWindow, RowBatch, RowId,
    SelectionChanged, SelectionMode, SelectionStateMachine, SelectorKind, ToggleInput,
    derive_columns, index_rows,
};

/// One item of a row stream: a batch, or the reason the fetch failed.
pub type RowFeed<K> = std::result::Result<RowBatch<K>, GridError>;

/// Whether toggle input is currently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Toggles are processed.
    #[default]
    Live,
    /// Controls are being rebuilt; toggles are dropped.
    Rebuilding,
}

/// The render-ready output of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridProjection<K> {
    columns: Vec<String>,
    rows: Vec<AnnotatedRow<K>>,
    bounds: Bounds,
}

impl<K: RowId> GridProjection<K> {
    /// The display columns, `#` first when row numbers are shown.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The rows of the current page.
    pub fn rows(&self) -> &[AnnotatedRow<K>] {
        &self.rows
    }

    /// The page's index range in the full batch.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Ids of the visible rows, in display order.
    pub fn visible_ids(&self) -> Vec<K> {
        self.rows.iter().map(|row| row.id().clone()).collect()
    }
}

/// Outbound channels of a grid.
pub struct GridSignals<K: RowId> {
    /// A new projection is ready to render.
    pub projection_changed: Signal<GridProjection<K>>,
    /// The selected set changed.
    pub selection_changed: Signal<SelectionChanged<K>>,
    /// The selection controls were rebuilt.
    pub controls_changed: Signal<ControlSet<K>>,
}

impl<K: RowId> GridSignals<K> {
    fn new() -> Self {
        Self {
            projection_changed: Signal::new(),
            selection_changed: Signal::new(),
            controls_changed: Signal::new(),
        }
    }

    fn emitters(&self) -> [&dyn SignalEmitter; 3] {
        [
            &self.projection_changed,
            &self.selection_changed,
            &self.controls_changed,
        ]
    }
}

struct GridState<K: RowId> {
    phase: Phase,
    disposed: bool,
    join: CombineLatest<RowBatch<K>, PageRequest>,
    columns: Vec<String>,
    indexed: Vec<AnnotatedRow<K>>,
    projection: Option<GridProjection<K>>,
    selection: SelectionStateMachine<K>,
    /// A restored selection not yet reconciled with a batch.
    seeded: bool,
    subscriptions: Vec<ConnectionGuard>,
}

impl<K: RowId> GridState<K> {
    fn project(&self, bounds: Bounds) -> GridProjection<K> {
        GridProjection {
            columns: self.columns.clone(),
            rows: bounds.slice(&self.indexed).to_vec(),
            bounds,
        }
    }

    /// Installs a projection and re-aligns the controls to it.
    ///
    /// Enters `Rebuilding` when the controls changed; the caller restores the
    /// returned phase once they are published.
    fn install(&mut self, projection: GridProjection<K>) -> Publication<K> {
        let previous = self.selection.controls().clone();
        let controls = self.selection.set_visible(projection.visible_ids());
        let controls = (*controls != previous).then(|| controls.clone());
        let restore = controls
            .as_ref()
            .map(|_| std::mem::replace(&mut self.phase, Phase::Rebuilding));

        self.projection = Some(projection.clone());
        Publication {
            restore,
            controls,
            projection: Some(projection),
            selection: None,
        }
    }

    /// Publishes the current controls under the rebuild guard.
    fn republish_controls(&mut self) -> Publication<K> {
        Publication {
            restore: Some(std::mem::replace(&mut self.phase, Phase::Rebuilding)),
            controls: Some(self.selection.controls().clone()),
            projection: None,
            selection: None,
        }
    }
}

/// Everything one state transition has to publish, gathered under the lock
/// and emitted after it is released.
struct Publication<K: RowId> {
    restore: Option<Phase>,
    controls: Option<ControlSet<K>>,
    projection: Option<GridProjection<K>>,
    selection: Option<SelectionChanged<K>>,
}

impl<K: RowId> Publication<K> {
    fn selection(selection: Option<SelectionChanged<K>>) -> Self {
        Self {
            restore: None,
            controls: None,
            projection: None,
            selection,
        }
    }
}

struct Shared<K: RowId> {
    config: GridConfig,
    state: Mutex<GridState<K>>,
    window: PaginationWindow,
    signals: GridSignals<K>,
}

/// A headless, paginated, selectable grid.
///
/// The controller is a cheap handle; clones drive the same grid.
pub struct GridController<K: RowId> {
    shared: Arc<Shared<K>>,
}

impl<K: RowId> Clone for GridController<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: RowId> GridController<K> {
    /// Creates a grid with no rows.
    pub fn new(config: GridConfig) -> Self {
        let config = config.normalized();
        let request = config.page_request();
        let state = GridState {
            phase: Phase::Live,
            disposed: false,
            join: CombineLatest::with_right(request),
            columns: Vec::new(),
            indexed: Vec::new(),
            projection: None,
            selection: SelectionStateMachine::new(config.select_mode),
            seeded: false,
            subscriptions: Vec::new(),
        };
        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(state),
            window: PaginationWindow::new(request),
            signals: GridSignals::new(),
        });

        let weak = Arc::downgrade(&shared);
        shared.window.page_changed.connect(move |changed| {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.on_page_changed(changed);
            }
        });

        tracing::debug!(
            target: targets::CONTROLLER,
            mode = ?shared.config.select_mode,
            page = request.page,
            size = request.size,
            "grid created"
        );
        Self { shared }
    }

    fn upgrade(weak: &Weak<Shared<K>>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The outbound channels.
    pub fn signals(&self) -> &GridSignals<K> {
        &self.shared.signals
    }

    /// The pagination window, for pager collaborators.
    ///
    /// Page moves made through it are applied to the grid.
    pub fn pager(&self) -> &PaginationWindow {
        &self.shared.window
    }

    /// The configuration the grid was created with.
    pub fn config(&self) -> &GridConfig {
        &self.shared.config
    }

    /// Whether toggles are currently accepted.
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Returns `true` once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    /// The last published projection.
    pub fn projection(&self) -> Option<GridProjection<K>> {
        self.shared.state.lock().projection.clone()
    }

    /// Columns of the current batch.
    pub fn columns(&self) -> Vec<String> {
        self.shared.state.lock().columns.clone()
    }

    /// Rows of the current page.
    pub fn visible_rows(&self) -> Vec<AnnotatedRow<K>> {
        self.shared
            .state
            .lock()
            .projection
            .as_ref()
            .map(|projection| projection.rows.clone())
            .unwrap_or_default()
    }

    /// Number of rows in the current batch.
    pub fn item_count(&self) -> usize {
        self.shared.window.item_count()
    }

    /// Number of pages in the current batch.
    pub fn page_count(&self) -> usize {
        self.shared.window.page_count()
    }

    /// Returns `true` if a page follows the current one.
    pub fn has_next(&self) -> bool {
        self.shared.window.has_next()
    }

    /// Returns `true` if a page precedes the current one.
    pub fn has_prev(&self) -> bool {
        self.shared.window.has_prev()
    }

    /// The current 1-based page.
    pub fn current_page(&self) -> usize {
        self.shared.window.page()
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.shared.window.size()
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> Vec<K> {
        self.shared.state.lock().selection.selected_ids().to_vec()
    }

    /// The current selection controls.
    pub fn controls(&self) -> ControlSet<K> {
        self.shared.state.lock().selection.controls().clone()
    }

    /// The active selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.shared.state.lock().selection.mode()
    }

    /// The control kind for the active mode.
    pub fn selector_kind(&self) -> SelectorKind {
        self.selection_mode().selector_kind()
    }

    /// Whether the header row is rendered.
    pub fn show_header(&self) -> bool {
        self.shared.config.show_header
    }

    /// Whether the pager is rendered.
    pub fn show_pager(&self) -> bool {
        self.shared.config.show_pager
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Pushes a new row batch.
    ///
    /// A batch that is the same snapshot as the current one is ignored.
    /// Otherwise the columns and ordinals are re-derived, the last page
    /// request is re-applied to the new row count, selected ids that no
    /// longer exist are dropped, and a new projection is published.
    pub fn push_rows(&self, batch: RowBatch<K>) {
        let mut state = self.shared.state.lock();
        if state.disposed {
            tracing::trace!(target: targets::CONTROLLER, "row batch after dispose ignored");
            return;
        }
        if state.join.left().is_some_and(|current| current.same_batch(&batch)) {
            tracing::trace!(target: targets::CONTROLLER, "same row batch, skipping");
            return;
        }

        let _span = PerfSpan::new("rebuild_projection");
        let item_count = batch.len();
        let Some((batch, request)) = state
            .join
            .push_left(batch)
            .map(|(batch, request)| (batch.clone(), *request))
        else {
            return;
        };
        let bounds = request.bounds(item_count);
        let columns = derive_columns(batch.rows(), self.shared.config.show_row_number);
        let indexed = index_rows(batch.rows());
        let alive: HashSet<K> = batch.ids().into_iter().collect();

        self.shared.window.set_item_count(item_count);
        state.columns = columns;
        state.indexed = indexed;
        let pruned = if std::mem::take(&mut state.seeded) {
            state.selection.retain_existing_silent(|id| alive.contains(id));
            None
        } else {
            state.selection.retain_existing(|id| alive.contains(id))
        };
        let projection = state.project(bounds);
        let mut publication = state.install(projection);
        publication.selection = pruned;

        tracing::debug!(
            target: targets::CONTROLLER,
            rows = item_count,
            start = bounds.start(),
            end = bounds.end(),
            "row batch applied"
        );
        drop(state);
        self.publish(publication);
    }

    /// Pushes one item of a fallible row stream.
    ///
    /// A failure is logged and the last projection and selection are kept.
    pub fn push_feed(&self, feed: RowFeed<K>) {
        match feed {
            Ok(batch) => self.push_rows(batch),
            Err(err) => {
                if !self.is_disposed() {
                    tracing::warn!(target: targets::CONTROLLER, %err, "row stream failed, keeping last projection");
                }
            }
        }
    }

    /// Applies a page request from a pager collaborator.
    ///
    /// A zero page or size is clamped to 1.
    pub fn request_page(&self, request: PageRequest) {
        if self.is_disposed() {
            return;
        }
        self.shared.window.apply(request);
    }

    /// Moves to `page` at the current size.
    pub fn page_to(&self, page: usize) {
        if self.is_disposed() {
            return;
        }
        self.shared.window.page_to(page);
    }

    /// Moves to the next page.
    pub fn page_next(&self) {
        if self.is_disposed() {
            return;
        }
        self.shared.window.page_next();
    }

    /// Moves to the previous page.
    pub fn page_prev(&self) {
        if self.is_disposed() {
            return;
        }
        self.shared.window.page_prev();
    }

    /// Processes raw input from the rendered selection controls.
    ///
    /// Dropped while the controls are being rebuilt.
    pub fn toggle(&self, input: ToggleInput<K>) {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return;
        }
        if state.phase == Phase::Rebuilding {
            tracing::trace!(target: targets::CONTROLLER, "toggle during rebuild ignored");
            return;
        }

        let raw = state.selection.expand_input(&input);
        let change = state.selection.apply_checks(&raw);
        let normalized = state.selection.controls().checked() != raw.as_slice();
        let mut publication = if normalized {
            state.republish_controls()
        } else {
            Publication::selection(None)
        };
        publication.selection = change;
        drop(state);
        self.publish(publication);
    }

    /// Checks or unchecks every visible row. Multi mode only.
    pub fn toggle_all(&self, checked: bool) {
        self.update_selection(|state| state.selection.toggle_all(checked));
    }

    /// Deselects everything.
    pub fn clear_selection(&self) {
        self.update_selection(|state| state.selection.clear());
    }

    /// Seeds the selection from persisted state without publishing a change.
    ///
    /// Ids missing from the current batch are dropped. Before the first
    /// batch they are dropped, still silently, once it arrives.
    pub fn restore_selection(&self, ids: impl IntoIterator<Item = K>) {
        self.update_selection(|state| {
            match state.join.left() {
                Some(batch) => {
                    let alive: HashSet<K> = batch.ids().into_iter().collect();
                    state.selection.restore(ids.into_iter().filter(|id| alive.contains(id)));
                    state.seeded = false;
                }
                None => {
                    state.selection.restore(ids);
                    state.seeded = true;
                }
            }
            None
        });
    }

    /// Switches the selection mode, resetting the selection silently.
    pub fn set_selection_mode(&self, mode: SelectionMode) {
        self.update_selection(|state| {
            state.selection.set_mode(mode);
            None
        });
    }

    /// Feeds the grid from a row stream.
    ///
    /// The connection is released by [`dispose`](Self::dispose).
    pub fn connect_rows(&self, source: &Arc<Signal<RowFeed<K>>>) {
        let weak = Arc::downgrade(&self.shared);
        let guard = source.connect_scoped(move |feed: &RowFeed<K>| {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.push_feed(feed.clone());
            }
        });
        self.keep_subscription(guard);
    }

    /// Feeds the grid from a stream of page requests.
    pub fn connect_pages(&self, source: &Arc<Signal<PageRequest>>) {
        let weak = Arc::downgrade(&self.shared);
        let guard = source.connect_scoped(move |request: &PageRequest| {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.request_page(*request);
            }
        });
        self.keep_subscription(guard);
    }

    /// Feeds the grid from the rendered controls.
    pub fn connect_toggles(&self, source: &Arc<Signal<ToggleInput<K>>>) {
        let weak = Arc::downgrade(&self.shared);
        let guard = source.connect_scoped(move |input: &ToggleInput<K>| {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.toggle(input.clone());
            }
        });
        self.keep_subscription(guard);
    }

    /// Tears the grid down.
    ///
    /// Releases every inbound connection and closes every outbound channel
    /// before returning; afterwards all inputs are silent no-ops. Calling it
    /// again does nothing.
    pub fn dispose(&self) {
        let subscriptions = {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.subscriptions)
        };
        let released = subscriptions.len();
        drop(subscriptions);

        for emitter in self.shared.signals.emitters() {
            emitter.close();
        }
        self.shared.window.page_changed.close();
        tracing::debug!(target: targets::CONTROLLER, released, "grid disposed");
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn on_page_changed(&self, changed: &PageChanged) {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return;
        }
        let request = PageRequest::new(changed.page, changed.size);
        let Some((batch, request)) = state.join.push_right(request) else {
            return;
        };
        let bounds = request.bounds(batch.len());
        if state
            .projection
            .as_ref()
            .is_some_and(|projection| projection.bounds == bounds)
        {
            tracing::trace!(target: targets::CONTROLLER, page = changed.page, "bounds unchanged, skipping projection");
            return;
        }

        let projection = state.project(bounds);
        let publication = state.install(projection);
        drop(state);
        self.publish(publication);
    }

    fn update_selection<F>(&self, update: F)
    where
        F: FnOnce(&mut GridState<K>) -> Option<SelectionChanged<K>>,
    {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return;
        }
        let previous = state.selection.controls().clone();
        let change = update(&mut *state);
        let mut publication = if *state.selection.controls() != previous {
            state.republish_controls()
        } else {
            Publication::selection(None)
        };
        publication.selection = change;
        drop(state);
        self.publish(publication);
    }

    fn keep_subscription(&self, guard: ConnectionGuard) {
        let mut state = self.shared.state.lock();
        if state.disposed {
            tracing::debug!(target: targets::CONTROLLER, "connect after dispose ignored");
            drop(state);
            drop(guard);
            return;
        }
        state.subscriptions.push(guard);
    }

    fn publish(&self, publication: Publication<K>) {
        let signals = &self.shared.signals;
        if let Some(controls) = publication.controls {
            signals.controls_changed.emit(controls);
        }
        if let Some(phase) = publication.restore {
            self.shared.state.lock().phase = phase;
        }
        if let Some(projection) = publication.projection {
            signals.projection_changed.emit(projection);
        }
        if let Some(change) = publication.selection {
            signals.selection_changed.emit(change);
        }
    }
}

static_assertions::assert_impl_all!(GridController<u32>: Send, Sync);
static_assertions::assert_impl_all!(GridController<String>: Send, Sync);
