//! Latest-value joins.
//!
//! [`CombineLatest`] pairs the most recent value of two independent inputs.
//! A fresh value on either side is paired with the current value of the other
//! side; nothing is produced until both sides have been seen once. This is
//! the join used to apply page bounds to row batches: a new page applies to
//! the current batch, and a new batch re-applies the last known page.

/// Holds the latest value from each of two inputs.
#[derive(Debug, Clone)]
pub struct CombineLatest<L, R> {
    left: Option<L>,
    right: Option<R>,
}

impl<L, R> Default for CombineLatest<L, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, R> CombineLatest<L, R> {
    /// Create an empty join.
    pub const fn new() -> Self {
        Self {
            left: None,
            right: None,
        }
    }

    /// Create a join whose right side already has a starting value.
    pub fn with_right(right: R) -> Self {
        Self {
            left: None,
            right: Some(right),
        }
    }

    /// Replace the left value and return the fresh pairing, if complete.
    pub fn push_left(&mut self, left: L) -> Option<(&L, &R)> {
        self.left = Some(left);
        self.pair()
    }

    /// Replace the right value and return the fresh pairing, if complete.
    pub fn push_right(&mut self, right: R) -> Option<(&L, &R)> {
        self.right = Some(right);
        self.pair()
    }

    /// The current pairing, if both sides have a value.
    pub fn pair(&self) -> Option<(&L, &R)> {
        Some((self.left.as_ref()?, self.right.as_ref()?))
    }

    /// The latest left value.
    pub fn left(&self) -> Option<&L> {
        self.left.as_ref()
    }

    /// The latest right value.
    pub fn right(&self) -> Option<&R> {
        self.right.as_ref()
    }

    /// Returns `true` once both sides have produced a value.
    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}
