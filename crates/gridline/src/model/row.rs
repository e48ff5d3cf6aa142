//! Row records and row batches.
//!
//! A [`Row`] is a typed identifier plus an open, ordered field map. A
//! [`RowBatch`] is one complete snapshot of rows as pushed by the data
//! source; batches are shared, never copied, and compared by identity.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use gridline_core::logging::targets;
use gridline_core::{GridError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Reserved key holding a row's identifier in serialized form.
pub const ID_KEY: &str = "id";

/// Reserved key of the synthetic row-number column.
pub const ROW_NUMBER_KEY: &str = "#";

/// Requirements for a row identifier.
///
/// Implemented for every type that is cheap enough to clone, hashable and
/// shareable across threads: integers, strings, UUIDs and so on.
pub trait RowId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> RowId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// A keyed record with arbitrary display fields.
///
/// Fields keep their insertion order, which is the order columns are derived
/// in. The reserved `id` key is never stored as a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<K> {
    id: K,
    fields: Map<String, Value>,
}

impl<K: RowId> Row<K> {
    /// Creates a row with no fields.
    pub fn new(id: K) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Adds a field, builder style.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Sets a field, returning the previous value.
    ///
    /// Writes to the reserved `id` key are ignored.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if key == ID_KEY {
            tracing::debug!(target: targets::ROWS, id = ?self.id, "ignoring write to reserved `id` field");
            return None;
        }
        self.fields.insert(key, value.into())
    }

    /// The row identifier.
    pub fn id(&self) -> &K {
        &self.id
    }

    /// Looks up a field value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields in insertion order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Field keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: RowId + DeserializeOwned> Row<K> {
    /// Builds a row from a JSON object, taking the identifier from its `id` key.
    ///
    /// `index` is the row's position in its batch and only used for error
    /// reporting.
    pub fn from_json(index: usize, value: Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(GridError::malformed_row(index, "row is not a JSON object"));
        };

        let mut raw_id = None;
        let mut fields = Map::new();
        for (key, value) in object {
            if key == ID_KEY {
                raw_id = Some(value);
            } else {
                fields.insert(key, value);
            }
        }

        let raw_id = match raw_id {
            None => return Err(GridError::malformed_row(index, "missing `id` field")),
            Some(Value::Null) => return Err(GridError::malformed_row(index, "`id` is null")),
            Some(raw_id) => raw_id,
        };
        let id = serde_json::from_value(raw_id)
            .map_err(|err| GridError::malformed_row(index, format!("unusable `id`: {err}")))?;

        Ok(Self { id, fields })
    }
}

/// One complete, ordered snapshot of rows.
///
/// Cloning a batch shares the same allocation. Two batches are the same
/// batch only if they share it, see [`RowBatch::same_batch`]. Identifiers
/// are expected to be unique within a batch; [`RowBatch::from_json_rows`]
/// enforces this, [`RowBatch::new`] trusts the caller.
#[derive(Debug)]
pub struct RowBatch<K> {
    rows: Arc<[Row<K>]>,
}

impl<K> Clone for RowBatch<K> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<K: RowId> RowBatch<K> {
    /// Wraps a fully materialized list of rows.
    pub fn new(rows: Vec<Row<K>>) -> Self {
        Self { rows: rows.into() }
    }

    /// An empty batch.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns `true` if both handles point at the same snapshot.
    pub fn same_batch(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// The rows in batch order.
    pub fn rows(&self) -> &[Row<K>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row identifiers in batch order.
    pub fn ids(&self) -> Vec<K> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }
}

impl<K: RowId + DeserializeOwned> RowBatch<K> {
    /// Builds a batch from JSON row objects.
    ///
    /// Rows that are not objects, lack an `id`, carry an id of the wrong type,
    /// or repeat an id seen earlier in the batch are dropped with a warning.
    /// The rest of the batch is kept.
    pub fn from_json_rows(values: Vec<Value>) -> Self {
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(values.len());

        for (index, value) in values.into_iter().enumerate() {
            let row = Row::<K>::from_json(index, value).and_then(|row| {
                if seen.insert(row.id.clone()) {
                    Ok(row)
                } else {
                    Err(GridError::malformed_row(index, format!("duplicate id {:?}", row.id)))
                }
            });
            match row {
                Ok(row) => rows.push(row),
                Err(err) => tracing::warn!(target: targets::ROWS, %err, "dropping row"),
            }
        }

        Self::new(rows)
    }

    /// Parses a JSON payload into a batch.
    ///
    /// Accepts either a bare array of rows or a list envelope of the form
    /// `{ "values": [...] }`. A payload that is neither is reported as an
    /// upstream data error.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|err| GridError::upstream(format!("invalid row payload: {err}")))?;

        match value {
            Value::Array(values) => Ok(Self::from_json_rows(values)),
            Value::Object(mut envelope) => match envelope.remove("values") {
                Some(Value::Array(values)) => Ok(Self::from_json_rows(values)),
                _ => Err(GridError::upstream("row payload object has no `values` array")),
            },
            _ => Err(GridError::upstream("row payload is neither an array nor a list envelope")),
        }
    }
}

impl<K: RowId> From<Vec<Row<K>>> for RowBatch<K> {
    fn from(rows: Vec<Row<K>>) -> Self {
        Self::new(rows)
    }
}

impl<K: RowId> FromIterator<Row<K>> for RowBatch<K> {
    fn from_iter<I: IntoIterator<Item = Row<K>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fields_keep_insertion_order() {
        let row = Row::new(1u32)
            .with_field("name", "Dr Nice")
            .with_field("notes", "Hello")
            .with_field("author", "x");
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["name", "notes", "author"]);
    }

    #[test]
    fn test_id_is_not_a_field() {
        let mut row = Row::new(7u32);
        assert_eq!(row.set_field("id", 8), None);
        assert!(row.field("id").is_none());
        assert_eq!(*row.id(), 7);
    }

    #[test]
    fn test_from_json_extracts_id_and_keeps_order() {
        let row = Row::<u32>::from_json(0, json!({"name": "Narco", "id": 12, "notes": "World"})).unwrap();
        assert_eq!(*row.id(), 12);
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["name", "notes"]);
    }

    #[test]
    fn test_from_json_rejects_missing_or_bad_ids() {
        assert!(matches!(
            Row::<u32>::from_json(2, json!({"name": "x"})),
            Err(GridError::MalformedRow { index: 2, .. })
        ));
        assert!(Row::<u32>::from_json(0, json!({"id": null})).is_err());
        assert!(Row::<u32>::from_json(0, json!({"id": "eleven"})).is_err());
        assert!(Row::<u32>::from_json(0, json!([1, 2])).is_err());
    }

    #[test]
    fn test_batch_drops_malformed_rows_only() {
        let batch = RowBatch::<u32>::from_json_rows(vec![
            json!({"id": 11, "name": "Dr Nice"}),
            json!({"name": "no id"}),
            json!({"id": 11, "name": "duplicate"}),
            json!({"id": 13, "name": "Bombasto"}),
        ]);
        assert_eq!(batch.ids(), vec![11, 13]);
    }

    #[test]
    fn test_batch_from_list_envelope() {
        let batch = RowBatch::<u32>::from_json_str(
            r#"{"values": [{"id": 11, "name": "Dr Nice"}, {"id": 12, "name": "Narco"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 2);

        let bare = RowBatch::<u32>::from_json_str(r#"[{"id": 1}]"#).unwrap();
        assert_eq!(bare.ids(), vec![1]);

        assert!(matches!(
            RowBatch::<u32>::from_json_str("{\"items\": []}"),
            Err(GridError::UpstreamData { .. })
        ));
        assert!(RowBatch::<u32>::from_json_str("not json").is_err());
    }

    #[test]
    fn test_same_batch_is_identity() {
        let batch = RowBatch::new(vec![Row::new(1u32)]);
        let shared = batch.clone();
        let copy = RowBatch::new(vec![Row::new(1u32)]);
        assert!(batch.same_batch(&shared));
        assert!(!batch.same_batch(&copy));
    }
}
