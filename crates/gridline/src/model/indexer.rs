//! Row numbering.
//!
//! Ordinals are positions in the full, pre-pagination batch, so row 7 of 40
//! stays row 7 whichever page it is shown on.

use serde_json::Value;

use super::row::{ROW_NUMBER_KEY, Row, RowId};

/// A row annotated with its 1-based ordinal in its batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow<K> {
    row: Row<K>,
    ordinal: usize,
}

impl<K: RowId> AnnotatedRow<K> {
    /// The row identifier.
    pub fn id(&self) -> &K {
        self.row.id()
    }

    /// The 1-based position of the row in its batch.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The underlying row.
    pub fn row(&self) -> &Row<K> {
        &self.row
    }

    /// Resolves a column to a value; `#` resolves to the ordinal.
    pub fn value(&self, column: &str) -> Option<Value> {
        if column == ROW_NUMBER_KEY {
            Some(Value::from(self.ordinal))
        } else {
            self.row.field(column).cloned()
        }
    }

    /// Resolves a column to display text.
    ///
    /// Strings are shown without quotes; missing and null values are empty.
    pub fn display(&self, column: &str) -> String {
        match self.value(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
        }
    }
}

/// Annotates every row with its position + 1.
///
/// The input is left untouched; annotated copies are returned.
pub fn index_rows<K: RowId>(rows: &[Row<K>]) -> Vec<AnnotatedRow<K>> {
    rows.iter()
        .enumerate()
        .map(|(position, row)| AnnotatedRow {
            row: row.clone(),
            ordinal: position + 1,
        })
        .collect()
}
