#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **eventflow-store** – Core task store abstraction for Eventflow.
//!
//! This crate defines the contract a task store must satisfy without
//! providing a concrete implementation. Storage backends (in-memory,
//! persistent, sharded) implement [`TaskStore`] in their own crates.
//!
//! Methods take `&self`, not `&mut self`: implementations are expected to
//! synchronize internally (a single lock over the backing map is enough)
//! so a store can be shared with a read-only consumer running concurrently
//! with the aggregator that owns it.

use eventflow_types::{RunstateVocabulary, TaskRecord};

/// Errors surfaced by a [`TaskStore`] implementation.
///
/// Both variants are precondition violations the aggregator itself never
/// triggers under normal operation (see §7 of the design: they are
/// programmer errors in a misused store, not something retried or
/// recovered from).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// `insert` was called for a uuid that already exists.
    #[error("task {0:?} already exists")]
    AlreadyExists(String),
    /// `update` was called for a uuid that does not exist.
    #[error("task {0:?} does not exist")]
    NotFound(String),
}

/// CRUD over task records keyed by UUID.
pub trait TaskStore: Send + Sync {
    /// Whether a task with the given uuid is currently stored.
    fn exists(&self, uuid: &str) -> bool;

    /// Fetch a task record by uuid.
    fn get(&self, uuid: &str) -> Option<TaskRecord>;

    /// Insert a brand-new task record.
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyExists`] if a record with the same
    /// uuid is already present.
    fn insert(&self, task: TaskRecord) -> Result<TaskRecord, StoreError>;

    /// Apply `delta` onto the stored record for `uuid`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if no record with that uuid
    /// exists.
    fn update(&self, uuid: &str, delta: &eventflow_types::ValueMap) -> Result<(), StoreError>;

    /// All records where `actual_runtime` is unset, or whose `state` is a
    /// member of `vocabulary`'s incomplete half.
    fn list_incomplete(&self, vocabulary: &RunstateVocabulary) -> Vec<TaskRecord>;

    /// Total number of stored records.
    fn len(&self) -> usize;

    /// Whether the store currently holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
