//! Raw lifecycle events as observed from the worker bus.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueMap};

/// One raw event: a mapping with at least a `uuid` and, for state-bearing
/// events, a `type`.
///
/// Distinct from [`crate::TaskRecord`] even though both wrap the same
/// [`ValueMap`] shape: an event is immutable, transient input, while a task
/// record is the aggregated, mutable output. Keeping them as separate types
/// stops normalizer code from accidentally mutating an event in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent(pub ValueMap);

impl RawEvent {
    /// The event's `uuid` field, if present, non-null, and a string.
    ///
    /// Distinguishes "missing" from "present but empty" only insofar as an
    /// empty string is still falsy per the aggregator's reject rule (§4.F).
    pub fn uuid(&self) -> Option<&str> {
        match self.0.get("uuid") {
            Some(Value::Str(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// The event's `type` field, if present and a string.
    pub fn event_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Whether `parent_id` is present in the event *and* explicitly `null`.
    ///
    /// A missing key and an explicit `null` are different things here: only
    /// the latter fixes the root task (invariant 3 of the data model). This
    /// is exactly why events carry `Option<Value>` semantics via key
    /// presence rather than collapsing "missing" and "null" together.
    pub fn parent_id_is_explicit_null(&self) -> bool {
        matches!(self.0.get("parent_id"), Some(Value::Null))
    }
}

impl Deref for RawEvent {
    type Target = ValueMap;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
