//! The row type: an open-ended, ordered collection of named fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::value::Value;

/// A single record flowing through a graph.
///
/// Backed by a `BTreeMap` rather than a hash map so that two rows with the
/// same fields compare and hash deterministically regardless of the order
/// fields were inserted in; several operators (`TopN`'s tie-break, the
/// external sort's spill/merge round trip) depend on `Row` having a total
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fetch a field required by `op`, turning a miss into a [`ConfigError`].
    pub fn require(&self, field: &str, op: &'static str) -> Result<&Value> {
        self.get(field).ok_or_else(|| {
            ConfigError::UnknownField {
                field: field.to_string(),
                op,
            }
            .into()
        })
    }

    /// Project this row down to a key tuple over `keys`, in `op`'s name.
    /// Missing fields are a [`ConfigError`], matching the Sort/Reduce/Join
    /// family of operators which all key rows the same way.
    pub fn key(&self, keys: &[String], op: &'static str) -> Result<Vec<Value>> {
        keys.iter()
            .map(|k| self.require(k, op).map(Value::clone))
            .collect()
    }

    /// A copy of this row restricted to `keys`; silently drops any key not
    /// present, used to carry a group's key fields into a reducer's output
    /// row.
    #[must_use]
    pub fn project(&self, keys: &[String]) -> Self {
        let mut out = Self::new();
        for key in keys {
            if let Some(value) = self.get(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trip() {
        let mut row = Row::new();
        row.insert("a", Value::Int(1));
        assert_eq!(row.get("a"), Some(&Value::Int(1)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn key_errors_on_missing_field() {
        let row = Row::new();
        let err = row.key(&["a".to_string()], "test").unwrap_err();
        assert!(err.to_string().contains('a'));
    }

    #[test]
    fn project_drops_absent_keys_silently() {
        let mut row = Row::new();
        row.insert("a", Value::Int(1));
        let projected = row.project(&["a".to_string(), "b".to_string()]);
        assert_eq!(projected.get("a"), Some(&Value::Int(1)));
        assert_eq!(projected.get("b"), None);
    }

    #[test]
    fn rows_order_by_sorted_field_pairs() {
        let mut a = Row::new();
        a.insert("x", Value::Int(1));
        let mut b = Row::new();
        b.insert("x", Value::Int(2));
        assert!(a < b);
    }
}
