#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **eventflow-store-memory** – In-memory task store for Eventflow.
//!
//! A fast, non-persistent backend suitable for embedding the aggregator in
//! a single process and for testing. All data is lost when the process
//! terminates. Interior mutability is provided by a single
//! [`std::sync::RwLock`] over an [`IndexMap`], so the store can be shared
//! (e.g. `Arc<InMemoryTaskStore>`) across threads without requiring `&mut`
//! access.

use std::sync::RwLock;

use indexmap::IndexMap;

use eventflow_store::{StoreError, TaskStore};
use eventflow_types::{RunstateVocabulary, TaskRecord, ValueMap};

/// An in-memory, non-persistent task store.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<IndexMap<String, TaskRecord>>,
}

impl InMemoryTaskStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn exists(&self, uuid: &str) -> bool {
        self.tasks.read().expect("task store lock poisoned").contains_key(uuid)
    }

    fn get(&self, uuid: &str) -> Option<TaskRecord> {
        self.tasks.read().expect("task store lock poisoned").get(uuid).cloned()
    }

    fn insert(&self, task: TaskRecord) -> Result<TaskRecord, StoreError> {
        let uuid = task
            .uuid()
            .map(str::to_string)
            .expect("caller must set uuid before inserting");

        let mut tasks = self.tasks.write().expect("task store lock poisoned");
        if tasks.contains_key(&uuid) {
            return Err(StoreError::AlreadyExists(uuid));
        }
        tasks.insert(uuid, task.clone());
        Ok(task)
    }

    fn update(&self, uuid: &str, delta: &ValueMap) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().expect("task store lock poisoned");
        let task = tasks
            .get_mut(uuid)
            .ok_or_else(|| StoreError::NotFound(uuid.to_string()))?;
        task.apply_delta(delta);
        Ok(())
    }

    fn list_incomplete(&self, vocabulary: &RunstateVocabulary) -> Vec<TaskRecord> {
        self.tasks
            .read()
            .expect("task store lock poisoned")
            .values()
            .filter(|task| {
                !task.has_actual_runtime()
                    || task.state().is_some_and(|s| vocabulary.is_incomplete(s))
            })
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.tasks.read().expect("task store lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventflow_types::Value;

    #[test]
    fn insert_then_get_returns_same_record() {
        let store = InMemoryTaskStore::new();
        let task = TaskRecord::new("abc", 1);
        store.insert(task.clone()).unwrap();
        assert_eq!(store.get("abc"), Some(task));
    }

    #[test]
    fn insert_duplicate_uuid_is_rejected() {
        let store = InMemoryTaskStore::new();
        store.insert(TaskRecord::new("abc", 1)).unwrap();
        let err = store.insert(TaskRecord::new("abc", 2)).unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("abc".to_string()));
    }

    #[test]
    fn update_missing_uuid_is_rejected() {
        let store = InMemoryTaskStore::new();
        let mut delta = ValueMap::new();
        delta.insert("state".to_string(), Value::Str("task-started".to_string()));
        let err = store.update("missing", &delta).unwrap_err();
        assert_eq!(err, StoreError::NotFound("missing".to_string()));
    }

    #[test]
    fn list_incomplete_honors_vocabulary_and_actual_runtime() {
        let store = InMemoryTaskStore::new();
        let vocab = RunstateVocabulary::canonical();

        let mut started = TaskRecord::new("a", 1);
        started.insert("state".to_string(), Value::Str("task-started".to_string()));
        store.insert(started).unwrap();

        let mut done = TaskRecord::new("b", 2);
        done.insert("state".to_string(), Value::Str("task-succeeded".to_string()));
        done.insert("actual_runtime".to_string(), Value::Float(1.5));
        store.insert(done).unwrap();

        let incomplete = store.list_incomplete(&vocab);
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].uuid(), Some("a"));
    }
}
