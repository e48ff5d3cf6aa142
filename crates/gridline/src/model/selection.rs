//! Selection state machine for the grid.
//!
//! This module provides [`SelectionStateMachine`], which keeps the set of
//! selected row ids consistent with the active [`SelectionMode`] while the
//! visible rows change underneath it.
//!
//! Selection is tracked by row id, never by position, so it survives
//! pagination and refetches. The per-row controls the presentation layer
//! renders are described by a [`ControlSet`], which is rebuilt from the
//! selection whenever the visible rows change and is never patched in place.
//!
//! Every mutating operation returns `Some(SelectionChanged)` only when the
//! set of selected ids genuinely changed. Rebuilding controls, restoring a
//! persisted selection, and order-only reshuffles never produce one.
//!
//! # Example
//!
//! ```
//! use gridline::model::{SelectionChanged, SelectionMode, SelectionStateMachine, ToggleInput};
//!
//! let mut selection = SelectionStateMachine::new(SelectionMode::Multi);
//! selection.set_visible(vec![1, 2, 3, 4, 5]);
//!
//! let change = selection.apply_toggle(ToggleInput::Checks(vec![true, false, true]));
//! assert_eq!(change, Some(SelectionChanged::Multi(vec![1, 3])));
//!
//! // Page 2: ids 1 and 3 stay selected while off screen.
//! selection.set_visible(vec![6, 7, 8, 9, 10]);
//! let change = selection.apply_toggle(ToggleInput::Checks(vec![false, true]));
//! assert_eq!(change, Some(SelectionChanged::Multi(vec![1, 3, 7])));
//! ```

use std::collections::HashSet;

use gridline_core::logging::targets;
use serde::{Deserialize, Serialize};

use super::row::RowId;

/// How many rows may be selected at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Nothing can be selected; toggles are ignored.
    None,
    /// At most one row is selected.
    Single,
    /// Any number of rows, kept in the order they were selected.
    #[default]
    Multi,
}

impl SelectionMode {
    /// The kind of control to render for this mode.
    pub fn selector_kind(self) -> SelectorKind {
        match self {
            Self::None => SelectorKind::Hidden,
            Self::Single => SelectorKind::Radio,
            Self::Multi => SelectorKind::Checkbox,
        }
    }
}

/// Per-row control kind for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// One checkbox per row.
    Checkbox,
    /// A radio group across the visible rows.
    Radio,
    /// No selection controls.
    Hidden,
}

/// Emitted when the selected ids change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionChanged<K> {
    /// The selected id in single mode, `None` once deselected.
    Single(Option<K>),
    /// The selected ids in multi mode, in selection order.
    Multi(Vec<K>),
}

impl<K: Clone> SelectionChanged<K> {
    /// The selected ids as a list, whatever the mode.
    pub fn ids(&self) -> Vec<K> {
        match self {
            Self::Single(id) => id.iter().cloned().collect(),
            Self::Multi(ids) => ids.clone(),
        }
    }
}

/// Raw input from the rendered selection controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleInput<K> {
    /// One flag per control, index-aligned to the visible rows at render time.
    Checks(Vec<bool>),
    /// The value of a radio group: the checked row's id, if any.
    Radio(Option<K>),
}

/// The selected ids under a mode.
///
/// Ids are kept in the order they became selected, with a hash set alongside
/// for O(1) membership checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState<K: RowId> {
    mode: SelectionMode,
    order: Vec<K>,
    members: HashSet<K>,
}

impl<K: RowId> SelectionState<K> {
    /// An empty selection.
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            order: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// The mode this selection obeys.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> &[K] {
        &self.order
    }

    /// Checks if an id is selected.
    pub fn contains(&self, id: &K) -> bool {
        self.members.contains(id)
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `ids` holds exactly the selected ids, in any order.
    pub fn same_members(&self, ids: &[K]) -> bool {
        let other: HashSet<&K> = ids.iter().collect();
        other.len() == self.members.len() && other.iter().all(|id| self.members.contains(*id))
    }

    fn replace(&mut self, ids: Vec<K>) {
        self.members.clear();
        self.order.clear();
        for id in ids {
            if self.members.insert(id.clone()) {
                self.order.push(id);
            }
        }
    }

    fn changed_event(&self) -> Option<SelectionChanged<K>> {
        match self.mode {
            SelectionMode::None => None,
            SelectionMode::Single => Some(SelectionChanged::Single(self.order.first().cloned())),
            SelectionMode::Multi => Some(SelectionChanged::Multi(self.order.clone())),
        }
    }
}

/// The selection controls for the visible rows.
///
/// Index-aligned to the visible ids it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSet<K> {
    kind: SelectorKind,
    ids: Vec<K>,
    checked: Vec<bool>,
}

impl<K: RowId> ControlSet<K> {
    fn build(state: &SelectionState<K>, ids: &[K]) -> Self {
        let kind = state.mode().selector_kind();
        let checked = ids
            .iter()
            .map(|id| kind != SelectorKind::Hidden && state.contains(id))
            .collect();
        Self {
            kind,
            ids: ids.to_vec(),
            checked,
        }
    }

    /// The control kind.
    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// The visible ids the controls belong to.
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    /// One flag per visible row.
    pub fn checked(&self) -> &[bool] {
        &self.checked
    }

    /// Whether the control at `index` is checked.
    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    /// The value of a radio group: the first checked id.
    pub fn radio_value(&self) -> Option<&K> {
        self.ids
            .iter()
            .zip(&self.checked)
            .find_map(|(id, &checked)| checked.then_some(id))
    }

    /// Number of controls.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no rows are visible.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Keeps selection consistent with the mode and the visible rows.
pub struct SelectionStateMachine<K: RowId> {
    state: SelectionState<K>,
    visible: Vec<K>,
    controls: ControlSet<K>,
}

impl<K: RowId> SelectionStateMachine<K> {
    /// Creates an empty machine with no visible rows.
    pub fn new(mode: SelectionMode) -> Self {
        let state = SelectionState::new(mode);
        let controls = ControlSet::build(&state, &[]);
        Self {
            state,
            visible: Vec::new(),
            controls,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The active mode.
    pub fn mode(&self) -> SelectionMode {
        self.state.mode()
    }

    /// The current selection.
    pub fn state(&self) -> &SelectionState<K> {
        &self.state
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> &[K] {
        self.state.selected_ids()
    }

    /// The visible ids the controls are aligned to.
    pub fn visible_ids(&self) -> &[K] {
        &self.visible
    }

    /// The current controls.
    pub fn controls(&self) -> &ControlSet<K> {
        &self.controls
    }

    // =========================================================================
    // Silent updates
    // =========================================================================

    /// Seeds the selection from previously persisted state.
    ///
    /// This is the first stabilization of a grid and never reports a change.
    /// Single mode keeps only the first id; none mode ignores the input.
    pub fn restore(&mut self, ids: impl IntoIterator<Item = K>) {
        let ids: Vec<K> = match self.mode() {
            SelectionMode::None => Vec::new(),
            SelectionMode::Single => ids.into_iter().take(1).collect(),
            SelectionMode::Multi => ids.into_iter().collect(),
        };
        self.state.replace(ids);
        self.rebuild_controls();
    }

    /// Re-aligns the controls to a new set of visible rows.
    ///
    /// Previously selected rows that are now visible show as checked. The
    /// selection itself is untouched and no change is reported.
    pub fn set_visible(&mut self, ids: Vec<K>) -> &ControlSet<K> {
        self.visible = ids;
        self.rebuild_controls();
        &self.controls
    }

    /// Switches mode, resetting the selection without reporting a change.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if mode == self.mode() {
            return;
        }
        tracing::debug!(target: targets::SELECTION, from = ?self.mode(), to = ?mode, "selection mode reset");
        self.state = SelectionState::new(mode);
        self.rebuild_controls();
    }

    // =========================================================================
    // Reported updates
    // =========================================================================

    /// Expands raw control input into one flag per visible row.
    ///
    /// Flags past the visible rows are dropped; missing flags count as
    /// unchecked. A radio value checks the matching visible row.
    pub fn expand_input(&self, input: &ToggleInput<K>) -> Vec<bool> {
        match input {
            ToggleInput::Checks(checks) => (0..self.visible.len())
                .map(|index| checks.get(index).copied().unwrap_or(false))
                .collect(),
            ToggleInput::Radio(value) => self
                .visible
                .iter()
                .map(|id| value.as_ref() == Some(id))
                .collect(),
        }
    }

    /// Processes a toggle batch from the rendered controls.
    pub fn apply_toggle(&mut self, input: ToggleInput<K>) -> Option<SelectionChanged<K>> {
        let checks = self.expand_input(&input);
        self.apply_checks(&checks)
    }

    /// Processes one flag per visible row.
    ///
    /// - Multi: the checked visible ids replace the visible part of the
    ///   selection; ids selected on other pages are kept.
    /// - Single: no checked row clears the selection and one selects it.
    ///   When more than one is checked, the row that was not selected
    ///   before wins; if every checked row was already selected, the first
    ///   checked row in scan order wins.
    /// - None: ignored.
    pub fn apply_checks(&mut self, checks: &[bool]) -> Option<SelectionChanged<K>> {
        let checked: Vec<K> = self
            .visible
            .iter()
            .zip(checks)
            .filter(|(_, checked)| **checked)
            .map(|(id, _)| id.clone())
            .collect();

        let next = match self.mode() {
            SelectionMode::None => {
                tracing::trace!(target: targets::SELECTION, "toggle ignored in none mode");
                return None;
            }
            SelectionMode::Multi => self.merge_visible(checked),
            SelectionMode::Single => self.pick_single(checked).into_iter().collect(),
        };

        self.commit(next)
    }

    /// Checks or unchecks every visible row. Multi mode only.
    pub fn toggle_all(&mut self, checked: bool) -> Option<SelectionChanged<K>> {
        if self.mode() != SelectionMode::Multi {
            tracing::trace!(target: targets::SELECTION, mode = ?self.mode(), "toggle_all ignored");
            return None;
        }
        let checks = vec![checked; self.visible.len()];
        self.apply_checks(&checks)
    }

    /// Deselects everything.
    pub fn clear(&mut self) -> Option<SelectionChanged<K>> {
        self.commit(Vec::new())
    }

    /// Drops selected ids for which `exists` is false.
    ///
    /// Used when a new batch arrives, so the selection never refers to rows
    /// that are gone.
    pub fn retain_existing<F>(&mut self, exists: F) -> Option<SelectionChanged<K>>
    where
        F: Fn(&K) -> bool,
    {
        let kept = self.surviving(exists);
        self.commit(kept)
    }

    /// Drops selected ids for which `exists` is false without reporting it.
    ///
    /// Used to reconcile a restored selection with the rows it is first
    /// shown against.
    pub fn retain_existing_silent<F>(&mut self, exists: F)
    where
        F: Fn(&K) -> bool,
    {
        let kept = self.surviving(exists);
        if kept.len() != self.state.len() {
            self.state.replace(kept);
            self.rebuild_controls();
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn merge_visible(&self, checked: Vec<K>) -> Vec<K> {
        let visible: HashSet<&K> = self.visible.iter().collect();
        let checked_set: HashSet<&K> = checked.iter().collect();

        let mut next: Vec<K> = self
            .state
            .selected_ids()
            .iter()
            .filter(|id| !visible.contains(id) || checked_set.contains(id))
            .cloned()
            .collect();
        let mut present: HashSet<K> = next.iter().cloned().collect();
        for id in checked {
            if present.insert(id.clone()) {
                next.push(id);
            }
        }
        next
    }

    fn surviving<F>(&self, exists: F) -> Vec<K>
    where
        F: Fn(&K) -> bool,
    {
        let kept: Vec<K> = self
            .state
            .selected_ids()
            .iter()
            .filter(|id| exists(id))
            .cloned()
            .collect();
        if kept.len() != self.state.len() {
            tracing::debug!(
                target: targets::SELECTION,
                dropped = self.state.len() - kept.len(),
                "pruning selection of vanished rows"
            );
        }
        kept
    }

    fn pick_single(&self, checked: Vec<K>) -> Option<K> {
        if checked.len() > 1 {
            tracing::debug!(
                target: targets::SELECTION,
                checked = checked.len(),
                "multiple rows checked in single mode"
            );
        }
        let newly_checked = checked.iter().find(|id| !self.state.contains(id)).cloned();
        newly_checked.or_else(|| checked.into_iter().next())
    }

    fn commit(&mut self, next: Vec<K>) -> Option<SelectionChanged<K>> {
        if self.mode() == SelectionMode::None {
            return None;
        }
        let changed = !self.state.same_members(&next);
        if changed {
            self.state.replace(next);
        }
        self.rebuild_controls();

        if !changed {
            return None;
        }
        tracing::debug!(target: targets::SELECTION, selected = self.state.len(), "selection changed");
        self.state.changed_event()
    }

    fn rebuild_controls(&mut self) {
        self.controls = ControlSet::build(&self.state, &self.visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_on(ids: Vec<u32>) -> SelectionStateMachine<u32> {
        let mut machine = SelectionStateMachine::new(SelectionMode::Multi);
        machine.set_visible(ids);
        machine
    }

    #[test]
    fn test_selection_machine_creation() {
        let machine = SelectionStateMachine::<u32>::new(SelectionMode::default());
        assert_eq!(machine.mode(), SelectionMode::Multi);
        assert!(machine.state().is_empty());
        assert!(machine.controls().is_empty());
    }

    #[test]
    fn test_multi_select_in_scan_order() {
        let mut machine = multi_on(vec![1, 2, 3, 4, 5]);
        let change = machine.apply_toggle(ToggleInput::Checks(vec![false, true, false, true, false]));
        assert_eq!(change, Some(SelectionChanged::Multi(vec![2, 4])));
        assert_eq!(machine.controls().checked(), &[false, true, false, true, false]);
    }

    #[test]
    fn test_multi_keeps_selection_order_not_row_order() {
        let mut machine = multi_on(vec![1, 2, 3]);
        machine.apply_toggle(ToggleInput::Checks(vec![false, false, true]));
        let change = machine.apply_toggle(ToggleInput::Checks(vec![true, false, true]));
        assert_eq!(change, Some(SelectionChanged::Multi(vec![3, 1])));
    }

    #[test]
    fn test_multi_survives_pagination() {
        let mut machine = multi_on(vec![1, 2, 3, 4, 5]);
        machine.apply_toggle(ToggleInput::Checks(vec![true, false, true, false, false]));

        machine.set_visible(vec![6, 7, 8, 9, 10]);
        assert!(machine.controls().checked().iter().all(|checked| !checked));
        let change = machine.apply_toggle(ToggleInput::Checks(vec![false, true, false, false, false]));
        assert_eq!(change, Some(SelectionChanged::Multi(vec![1, 3, 7])));

        machine.set_visible(vec![1, 2, 3, 4, 5]);
        assert_eq!(machine.controls().checked(), &[true, false, true, false, false]);
    }

    #[test]
    fn test_multi_off_then_on_nets_out() {
        let mut machine = multi_on(vec![1, 2, 3]);
        machine.apply_toggle(ToggleInput::Checks(vec![true, true, false]));

        let off = machine.apply_toggle(ToggleInput::Checks(vec![true, false, false]));
        let on = machine.apply_toggle(ToggleInput::Checks(vec![true, true, false]));
        assert_eq!(off, Some(SelectionChanged::Multi(vec![1])));
        assert_eq!(on, Some(SelectionChanged::Multi(vec![1, 2])));

        // The same raw values again are not a change.
        assert_eq!(machine.apply_toggle(ToggleInput::Checks(vec![true, true, false])), None);
    }

    #[test]
    fn test_toggle_longer_than_visible_is_truncated() {
        let mut machine = multi_on(vec![1, 2]);
        let change = machine.apply_toggle(ToggleInput::Checks(vec![false, true, true, true]));
        assert_eq!(change, Some(SelectionChanged::Multi(vec![2])));
        assert_eq!(machine.controls().len(), 2);
    }

    #[test]
    fn test_single_replaces_previous() {
        let mut machine = SelectionStateMachine::new(SelectionMode::Single);
        machine.set_visible(vec![1u32, 2, 3]);

        let first = machine.apply_toggle(ToggleInput::Radio(Some(1)));
        assert_eq!(first, Some(SelectionChanged::Single(Some(1))));

        let second = machine.apply_toggle(ToggleInput::Radio(Some(2)));
        assert_eq!(second, Some(SelectionChanged::Single(Some(2))));
        assert_eq!(machine.selected_ids(), &[2]);
        assert_eq!(machine.controls().radio_value(), Some(&2));
        assert_eq!(machine.controls().kind(), SelectorKind::Radio);
    }

    #[test]
    fn test_single_tie_break_prefers_newly_checked() {
        let mut machine = SelectionStateMachine::new(SelectionMode::Single);
        machine.set_visible(vec![1u32, 2, 3]);
        machine.apply_toggle(ToggleInput::Checks(vec![false, true, false]));

        // Checkbox race: 2 is still checked and 3 was just checked.
        let change = machine.apply_toggle(ToggleInput::Checks(vec![false, true, true]));
        assert_eq!(change, Some(SelectionChanged::Single(Some(3))));
        assert_eq!(machine.controls().checked(), &[false, false, true]);
    }

    #[test]
    fn test_single_tie_break_falls_back_to_scan_order() {
        let mut machine = SelectionStateMachine::new(SelectionMode::Single);
        machine.set_visible(vec![1u32, 2, 3]);

        // Two new rows at once: first by scan order wins.
        let change = machine.apply_toggle(ToggleInput::Checks(vec![true, false, true]));
        assert_eq!(change, Some(SelectionChanged::Single(Some(1))));

        // Only the selected row checked: nothing changes.
        assert_eq!(machine.apply_toggle(ToggleInput::Checks(vec![true, false, false])), None);
        assert_eq!(machine.pick_single(vec![1]), Some(1));
    }

    #[test]
    fn test_single_zero_checked_clears() {
        let mut machine = SelectionStateMachine::new(SelectionMode::Single);
        machine.set_visible(vec![1u32, 2]);
        machine.apply_toggle(ToggleInput::Radio(Some(1)));
        let change = machine.apply_toggle(ToggleInput::Checks(vec![false, false]));
        assert_eq!(change, Some(SelectionChanged::Single(None)));
        assert!(machine.state().is_empty());
    }

    #[test]
    fn test_none_mode_never_reports() {
        let mut machine = SelectionStateMachine::new(SelectionMode::None);
        machine.set_visible(vec![1u32, 2, 3]);
        assert_eq!(machine.apply_toggle(ToggleInput::Checks(vec![true, true, true])), None);
        assert_eq!(machine.apply_toggle(ToggleInput::Radio(Some(2))), None);
        assert_eq!(machine.toggle_all(true), None);
        assert_eq!(machine.clear(), None);
        machine.restore(vec![1, 2]);
        assert!(machine.state().is_empty());
        assert_eq!(machine.controls().kind(), SelectorKind::Hidden);
        assert!(machine.controls().checked().iter().all(|checked| !checked));
    }

    #[test]
    fn test_restore_and_rebuild_are_silent() {
        let mut machine = SelectionStateMachine::new(SelectionMode::Multi);
        machine.restore(vec![3u32, 1]);
        machine.set_visible(vec![1, 2, 3]);
        assert_eq!(machine.controls().checked(), &[true, false, true]);
        assert_eq!(machine.selected_ids(), &[3, 1]);

        // Echoing the restored state back is not a change.
        assert_eq!(machine.apply_toggle(ToggleInput::Checks(vec![true, false, true])), None);
    }

    #[test]
    fn test_toggle_all_visible() {
        let mut machine = multi_on(vec![1, 2, 3]);
        machine.restore(vec![9]);
        let change = machine.toggle_all(true);
        assert_eq!(change, Some(SelectionChanged::Multi(vec![9, 1, 2, 3])));
        assert_eq!(machine.toggle_all(true), None);

        let change = machine.toggle_all(false);
        assert_eq!(change, Some(SelectionChanged::Multi(vec![9])));
    }

    #[test]
    fn test_clear_reports_once() {
        let mut machine = multi_on(vec![1, 2]);
        machine.apply_toggle(ToggleInput::Checks(vec![true, true]));
        assert_eq!(machine.clear(), Some(SelectionChanged::Multi(Vec::new())));
        assert_eq!(machine.clear(), None);
    }

    #[test]
    fn test_retain_existing_prunes_vanished_ids() {
        let mut machine = multi_on(vec![1, 2, 3]);
        machine.apply_toggle(ToggleInput::Checks(vec![true, false, true]));

        let alive: HashSet<u32> = [1, 2].into_iter().collect();
        let change = machine.retain_existing(|id| alive.contains(id));
        assert_eq!(change, Some(SelectionChanged::Multi(vec![1])));
        assert_eq!(machine.retain_existing(|id| alive.contains(id)), None);
    }

    #[test]
    fn test_silent_prune_keeps_order_and_updates_controls() {
        let mut machine = SelectionStateMachine::new(SelectionMode::Multi);
        machine.restore(vec![3u32, 99, 1]);
        machine.set_visible(vec![1, 2, 3]);

        let alive: HashSet<u32> = [1, 2, 3].into_iter().collect();
        machine.retain_existing_silent(|id| alive.contains(id));
        assert_eq!(machine.selected_ids(), &[3, 1]);
        assert_eq!(machine.controls().checked(), &[true, false, true]);

        // Nothing left to prune: a later reported prune is not a change.
        assert_eq!(machine.retain_existing(|id| alive.contains(id)), None);
    }

    #[test]
    fn test_set_mode_resets_silently() {
        let mut machine = multi_on(vec![1, 2]);
        machine.apply_toggle(ToggleInput::Checks(vec![true, true]));
        machine.set_mode(SelectionMode::Single);
        assert!(machine.state().is_empty());
        assert_eq!(machine.controls().kind(), SelectorKind::Radio);
        assert_eq!(machine.controls().checked(), &[false, false]);
    }

    #[test]
    fn test_same_members_ignores_order() {
        let mut state = SelectionState::new(SelectionMode::Multi);
        state.replace(vec![1u32, 2, 3]);
        assert!(state.same_members(&[3, 1, 2]));
        assert!(!state.same_members(&[1, 2]));
        assert!(!state.same_members(&[1, 2, 4]));
    }

    #[test]
    fn test_changed_event_ids() {
        assert_eq!(SelectionChanged::Single(Some(4u32)).ids(), vec![4]);
        assert!(SelectionChanged::<u32>::Single(None).ids().is_empty());
        assert_eq!(SelectionChanged::Multi(vec![2u32, 1]).ids(), vec![2, 1]);
    }
}
