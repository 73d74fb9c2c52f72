//! The aggregated, mutable per-task record held by the store.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::column::TaskColumn;
use crate::value::{Value, ValueMap};

/// A single task's aggregated state.
///
/// A thin wrapper over the open field map rather than a fixed struct: the
/// data model is intentionally open (§3 of the data model — unknown fields
/// may be stored) while the fields the aggregator reasons about (`uuid`,
/// `task_num`, `state`, ...) get typed accessors below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord(pub ValueMap);

impl TaskRecord {
    /// Build a freshly-created task record with only the fields the
    /// aggregator is required to set on insertion.
    pub fn new(uuid: impl Into<String>, task_num: u64) -> Self {
        let mut map = ValueMap::new();
        map.insert(TaskColumn::Uuid.to_string(), Value::Str(uuid.into()));
        map.insert(TaskColumn::TaskNum.to_string(), Value::Int(task_num as i64));
        TaskRecord(map)
    }

    /// The task's UUID, if present and a string.
    pub fn uuid(&self) -> Option<&str> {
        self.0.get(TaskColumn::Uuid.as_str()).and_then(Value::as_str)
    }

    /// The task's canonical state, if present and a string.
    pub fn state(&self) -> Option<&str> {
        self.0.get(TaskColumn::State.as_str()).and_then(Value::as_str)
    }

    /// Whether `actual_runtime` has been set (not absent, not `Null`).
    pub fn has_actual_runtime(&self) -> bool {
        self.0
            .get(TaskColumn::ActualRuntime.as_str())
            .is_some_and(Value::is_present)
    }

    /// The task's `first_started` value, if present.
    pub fn first_started(&self) -> Option<&Value> {
        self.0.get(TaskColumn::FirstStarted.as_str())
    }

    /// Apply a delta produced by the change detector, overwriting any
    /// colliding keys.
    pub fn apply_delta(&mut self, delta: &ValueMap) {
        for (k, v) in delta {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

impl Deref for TaskRecord {
    type Target = ValueMap;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TaskRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_uuid_and_task_num_only() {
        let task = TaskRecord::new("abc", 3);
        assert_eq!(task.uuid(), Some("abc"));
        assert_eq!(task.get(TaskColumn::TaskNum.as_str()), Some(&Value::Int(3)));
        assert_eq!(task.0.len(), 2);
    }

    #[test]
    fn apply_delta_overwrites_colliding_keys() {
        let mut task = TaskRecord::new("abc", 1);
        task.insert("retries".to_string(), Value::Int(0));

        let mut delta = ValueMap::new();
        delta.insert("retries".to_string(), Value::Int(1));
        task.apply_delta(&delta);

        assert_eq!(task.get("retries"), Some(&Value::Int(1)));
    }

    #[test]
    fn has_actual_runtime_is_false_for_explicit_null() {
        let mut task = TaskRecord::new("abc", 1);
        task.insert(TaskColumn::ActualRuntime.to_string(), Value::Null);
        assert!(!task.has_actual_runtime());

        task.insert(TaskColumn::ActualRuntime.to_string(), Value::Float(1.0));
        assert!(task.has_actual_runtime());
    }
}
