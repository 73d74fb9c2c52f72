//! The dynamic value type task records and events are built from.
//!
//! Field values arrive from a transport we don't control the schema of, so
//! the data model is a small closed tagged variant rather than a typed
//! struct per event kind. `Map` preserves insertion order ([`IndexMap`])
//! because task records are serialized for human-facing reports where
//! field order is worth keeping stable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single field value in an event or task record.
///
/// `Set` is represented as a `Vec` rather than a `HashSet` because the only
/// operation performed on it is whole-collection union with de-duplication
/// by [`PartialEq`] (see [`crate::merge`] in `eventflow-policy`), and not
/// every value inside is hashable (floats, nested maps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON `null` / absence of a meaningful value.
    Null,
    /// A boolean flag.
    Bool(bool),
    /// A signed integer (task numbers, retry counts, chain depth, ...).
    Int(i64),
    /// A floating point number (timestamps, runtimes).
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// An ordered sequence, concatenated on merge.
    Seq(Vec<Value>),
    /// An unordered collection, unioned on merge.
    Set(Vec<Value>),
    /// A string-keyed nested map, recursively merged.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Borrow the inner string, if this value is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the inner map, if this value is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// True for everything except [`Value::Null`].
    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Convenience alias for the map type underlying every record and update.
pub type ValueMap = IndexMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_representation_matches_the_wire_shape_events_arrive_in() {
        // `Value` must deserialize straight from the JSON an event producer
        // sends, with no wrapper tag naming the variant.
        let v: Value = serde_json::from_str(r#""task-started""#).unwrap();
        assert_eq!(v, Value::Str("task-started".to_string()));

        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::Int(42));

        let v: Value = serde_json::from_str(r#"{"a": 1, "b": [1, 2]}"#).unwrap();
        let Value::Map(m) = v else { panic!("expected map") };
        assert_eq!(m.get("a"), Some(&Value::Int(1)));
        assert_eq!(m.get("b"), Some(&Value::Seq(vec![Value::Int(1), Value::Int(2)])));
    }

    #[test]
    fn null_is_not_present() {
        assert!(!Value::Null.is_present());
        assert!(Value::Bool(false).is_present());
    }
}
