//! Column derivation.

use std::collections::HashSet;

use super::row::{ROW_NUMBER_KEY, Row, RowId};

/// Derives the ordered display columns of a batch.
///
/// Keys appear in first-seen order: the first row's keys in that row's own
/// order, then keys introduced by later rows. Duplicates and the reserved
/// `id` and `#` keys are left out. When `show_row_number` is set, the
/// synthetic `#` column is prepended.
pub fn derive_columns<K: RowId>(rows: &[Row<K>], show_row_number: bool) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();

    if show_row_number {
        columns.push(ROW_NUMBER_KEY.to_string());
    }

    for key in rows.iter().flat_map(Row::keys) {
        if key == ROW_NUMBER_KEY {
            continue;
        }
        if seen.insert(key) {
            columns.push(key.to_string());
        }
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order_with_row_number() {
        let rows = vec![
            Row::new(1u32).with_field("name", "a"),
            Row::new(2u32).with_field("name", "a").with_field("extra", "x"),
        ];
        assert_eq!(derive_columns(&rows, true), vec!["#", "name", "extra"]);
        assert_eq!(derive_columns(&rows, false), vec!["name", "extra"]);
    }

    #[test]
    fn test_first_row_order_wins() {
        let rows = vec![
            Row::new(1u32).with_field("notes", "n").with_field("name", "a"),
            Row::new(2u32).with_field("name", "b").with_field("author", "c").with_field("notes", "m"),
        ];
        assert_eq!(derive_columns(&rows, false), vec!["notes", "name", "author"]);
    }

    #[test]
    fn test_empty_batch() {
        let rows: Vec<Row<u32>> = Vec::new();
        assert!(derive_columns(&rows, false).is_empty());
        assert_eq!(derive_columns(&rows, true), vec!["#"]);
    }

    #[test]
    fn test_reserved_row_number_field_is_hidden() {
        let rows = vec![Row::new(1u32).with_field("#", 99).with_field("name", "a")];
        assert_eq!(derive_columns(&rows, true), vec!["#", "name"]);
    }
}
