#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **eventflow-aggregator** – Orchestrates the field policy registry, deep
//! merge, normalizer, and change detector (all in `eventflow-policy`)
//! across a stream of events against a [`TaskStore`], tracking the root
//! task and allocating task numbers.
//!
//! The core is single-threaded and cooperative: every public method takes
//! `&mut self` and is a straight-line transformation over the store, with
//! no suspension points. A host that needs to share one aggregator across
//! threads wraps the whole thing in `Arc<Mutex<EventAggregator<_>>>`,
//! which transitively protects the store and the two counters since they
//! all live behind the same `&mut self` borrow.

mod clock;

pub use clock::{Clock, SystemClock};

use std::collections::HashMap;
use std::sync::Arc;

use eventflow_policy::{diff, normalize, FieldPolicyRegistry, PolicyError};
use eventflow_store::TaskStore;
use eventflow_types::{RawEvent, RunstateVocabulary, TaskColumn, TaskRecord, Value, ValueMap};
use tracing::{debug, trace};

/// One task's uuid mapped to the change-set produced for it.
pub type ChangeSets = HashMap<String, ValueMap>;

/// The aggregator core: folds raw events into a [`TaskStore`], tracking
/// the root task and the next task number to allocate.
pub struct EventAggregator<S, C = SystemClock> {
    new_task_num: u64,
    root_uuid: Option<String>,
    policy: FieldPolicyRegistry,
    vocabulary: Arc<RunstateVocabulary>,
    store: S,
    clock: C,
}

impl<S: TaskStore> EventAggregator<S, SystemClock> {
    /// Build an aggregator over `store`, using the canonical run-state
    /// vocabulary and the real wall clock.
    pub fn new(store: S) -> Self {
        Self::with_vocabulary(store, RunstateVocabulary::canonical())
    }

    /// Build an aggregator with an explicit run-state vocabulary.
    pub fn with_vocabulary(store: S, vocabulary: RunstateVocabulary) -> Self {
        let vocabulary = Arc::new(vocabulary);
        Self {
            new_task_num: 1,
            root_uuid: None,
            policy: FieldPolicyRegistry::default_for(vocabulary.clone()),
            vocabulary,
            store,
            clock: SystemClock,
        }
    }
}

impl<S: TaskStore, C: Clock> EventAggregator<S, C> {
    /// Build an aggregator with an explicit vocabulary and clock, for
    /// tests that need a fixed time source.
    pub fn with_clock(store: S, vocabulary: RunstateVocabulary, clock: C) -> Self {
        let vocabulary = Arc::new(vocabulary);
        Self {
            new_task_num: 1,
            root_uuid: None,
            policy: FieldPolicyRegistry::default_for(vocabulary.clone()),
            vocabulary,
            store,
            clock,
        }
    }

    /// The uuid fixed as the root task, if one has been observed yet.
    pub fn root_uuid(&self) -> Option<&str> {
        self.root_uuid.as_deref()
    }

    /// The underlying store, for read-only inspection by a caller (e.g. a
    /// reporter).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fold `aggregate_event` over `events`, merging per-event change-sets
    /// per-uuid (last write wins for scalar keys within the same batch).
    ///
    /// # Errors
    /// Propagates the first [`PolicyError`] encountered (§7 error kind 3:
    /// a malformed transform payload is a schema error, not something to
    /// drop silently like a malformed uuid).
    pub fn aggregate_events(&mut self, events: &[RawEvent]) -> Result<ChangeSets, PolicyError> {
        let mut batched: ChangeSets = HashMap::new();
        for event in events {
            for (uuid, change) in self.aggregate_event(event)? {
                batched.entry(uuid).or_default().extend(change);
            }
        }
        Ok(batched)
    }

    /// Fold a single event into the store, returning the change-set it
    /// produced (empty if the event was rejected).
    ///
    /// # Errors
    /// Returns a [`PolicyError`] if a transform rejects the event's
    /// payload (§7 error kind 3); this is a schema error and is propagated
    /// rather than swallowed like the kind-1 malformed-uuid case.
    pub fn aggregate_event(&mut self, event: &RawEvent) -> Result<ChangeSets, PolicyError> {
        let Some(uuid) = event.uuid() else {
            trace!("dropping event with missing or empty uuid");
            return Ok(ChangeSets::new());
        };

        let event_type = event.event_type();
        if !self.store.exists(uuid) && event_type == Some(eventflow_types::REVOKED_EVENT_TYPE) {
            debug!(uuid, "dropping revoke event for unknown task");
            return Ok(ChangeSets::new());
        }

        if self.root_uuid.is_none() && event.parent_id_is_explicit_null() {
            self.root_uuid = Some(uuid.to_string());
            debug!(uuid, "fixed root task");
        }

        let proposed = normalize(event, &self.policy)?;

        let mut result = ChangeSets::new();

        if !self.store.exists(uuid) {
            let mut record = TaskRecord::new(uuid, self.new_task_num);
            record.apply_delta(&proposed);
            let inserted = self
                .store
                .insert(record)
                .expect("store reported !exists but rejected the insert");
            self.new_task_num += 1;
            result.insert(uuid.to_string(), inserted.0);
            return Ok(result);
        }

        let existing = self.store.get(uuid).expect("store reported exists but get failed");
        let delta = diff(&existing, &proposed, &self.policy);
        if !delta.is_empty() {
            self.store
                .update(uuid, &delta)
                .expect("store reported exists but update failed");
        }
        result.insert(uuid.to_string(), delta);
        Ok(result)
    }

    /// True iff the root task is fixed, exists, and its state is a
    /// member of the complete half of the vocabulary.
    pub fn is_root_complete(&self) -> bool {
        let Some(root_uuid) = &self.root_uuid else { return false };
        let Some(root) = self.store.get(root_uuid) else { return false };
        root.state().is_some_and(|s| self.vocabulary.is_complete(s))
    }

    /// `is_root_complete() && list_incomplete().is_empty()`.
    pub fn are_all_tasks_complete(&self) -> bool {
        self.is_root_complete() && self.store.list_incomplete(&self.vocabulary).is_empty()
    }

    /// Synthesize a terminal event for every task the store still
    /// considers incomplete: `task-completed` if its last known state was
    /// in the complete half of the vocabulary (dangling despite a
    /// terminal state having been observed), `task-incomplete` otherwise.
    ///
    /// `task-incomplete` is deliberately not itself a member of either
    /// runstate half: a record carrying it only leaves
    /// `list_incomplete` once `actual_runtime` is set, which this method
    /// always attaches, so feeding its own output back through
    /// `aggregate_events` converges rather than looping.
    pub fn generate_incomplete_events(&self) -> Vec<RawEvent> {
        let now = self.clock.now();
        self.store
            .list_incomplete(&self.vocabulary)
            .into_iter()
            .map(|task| {
                let uuid = task.uuid().unwrap_or_default().to_string();
                let event_type = match task.state() {
                    Some(state) if self.vocabulary.is_complete(state) => "task-completed",
                    _ => "task-incomplete",
                };

                let mut event = ValueMap::new();
                event.insert("uuid".to_string(), Value::Str(uuid));
                event.insert("type".to_string(), Value::Str(event_type.to_string()));

                if !task.has_actual_runtime() {
                    let first_started = match task.first_started() {
                        Some(Value::Float(f)) => *f,
                        Some(Value::Int(i)) => *i as f64,
                        _ => now,
                    };
                    event.insert(
                        TaskColumn::ActualRuntime.to_string(),
                        Value::Float(now - first_started),
                    );
                }

                RawEvent(event)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock::FixedClock;
    use eventflow_store_memory::InMemoryTaskStore;
    use indexmap::indexmap;

    fn event(fields: ValueMap) -> RawEvent {
        RawEvent(fields)
    }

    fn aggregator() -> EventAggregator<InMemoryTaskStore, FixedClock> {
        EventAggregator::with_clock(
            InMemoryTaskStore::new(),
            RunstateVocabulary::canonical(),
            FixedClock(1000.0),
        )
    }

    #[test]
    fn single_started_event_creates_task_with_task_num_one() {
        let mut agg = aggregator();
        let e = event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
            "parent_id".to_string() => Value::Null,
        });

        let changes = agg.aggregate_event(&e).unwrap();
        assert_eq!(agg.root_uuid(), Some("a"));
        let record = changes.get("a").unwrap();
        assert_eq!(record.get("task_num"), Some(&Value::Int(1)));
        assert_eq!(record.get("state"), Some(&Value::Str("task-started".to_string())));
    }

    #[test]
    fn revoke_for_unknown_uuid_is_dropped() {
        let mut agg = aggregator();
        let e = event(indexmap! {
            "uuid".to_string() => Value::Str("ghost".to_string()),
            "type".to_string() => Value::Str("task-revoked".to_string()),
        });
        let changes = agg.aggregate_event(&e).unwrap();
        assert!(changes.is_empty());
        assert!(!agg.store().exists("ghost"));
    }

    #[test]
    fn firex_revoke_complete_overrides_and_is_not_reverted() {
        let mut agg = aggregator();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
        }))
        .unwrap();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("firex-revoke-complete".to_string()),
        }))
        .unwrap();

        let task = agg.store().get("a").unwrap();
        assert_eq!(task.state(), Some("task-revoked"));
    }

    #[test]
    fn name_is_derived_from_long_name_last_segment() {
        let mut agg = aggregator();
        let changes = agg
            .aggregate_event(&event(indexmap! {
                "uuid".to_string() => Value::Str("a".to_string()),
                "long_name".to_string() => Value::Str("pkg.mod.MyTask".to_string()),
            }))
            .unwrap();
        let record = changes.get("a").unwrap();
        assert_eq!(record.get("name"), Some(&Value::Str("MyTask".to_string())));
        assert_eq!(record.get("long_name"), Some(&Value::Str("pkg.mod.MyTask".to_string())));
    }

    #[test]
    fn states_deep_merge_across_two_events() {
        let mut agg = aggregator();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("task-received".to_string()),
        }))
        .unwrap();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
        }))
        .unwrap();

        let task = agg.store().get("a").unwrap();
        let Some(Value::Seq(states)) = task.get("states") else { panic!("expected states seq") };
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn is_root_complete_requires_root_task_in_complete_state() {
        let mut agg = aggregator();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("root".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
            "parent_id".to_string() => Value::Null,
        }))
        .unwrap();
        assert!(!agg.is_root_complete());

        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("root".to_string()),
            "type".to_string() => Value::Str("task-succeeded".to_string()),
        }))
        .unwrap();
        assert!(agg.is_root_complete());
    }

    #[test]
    fn are_all_tasks_complete_false_until_incomplete_children_finish() {
        let mut agg = aggregator();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("root".to_string()),
            "type".to_string() => Value::Str("task-succeeded".to_string()),
            "parent_id".to_string() => Value::Null,
        }))
        .unwrap();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("child".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
            "parent_id".to_string() => Value::Str("root".to_string()),
        }))
        .unwrap();

        assert!(agg.is_root_complete());
        assert!(!agg.are_all_tasks_complete());
    }

    #[test]
    fn generate_incomplete_events_attaches_actual_runtime() {
        let mut agg = aggregator();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
            "local_received".to_string() => Value::Float(900.0),
        }))
        .unwrap();

        let synthesized = agg.generate_incomplete_events();
        assert_eq!(synthesized.len(), 1);
        assert_eq!(synthesized[0].event_type(), Some("task-incomplete"));
        assert_eq!(synthesized[0].get("actual_runtime"), Some(&Value::Float(100.0)));
    }

    #[test]
    fn feeding_incomplete_event_back_eventually_converges() {
        let mut agg = aggregator();
        agg.aggregate_event(&event(indexmap! {
            "uuid".to_string() => Value::Str("a".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
            "parent_id".to_string() => Value::Null,
        }))
        .unwrap();

        let synthesized = agg.generate_incomplete_events();
        agg.aggregate_events(&synthesized).unwrap();

        // actual_runtime is now set, so the task no longer appears incomplete
        // purely on that basis (its state is still task-started though).
        let task = agg.store().get("a").unwrap();
        assert!(task.has_actual_runtime());
    }

    #[test]
    fn malformed_transform_payload_is_propagated_not_swallowed() {
        let mut agg = aggregator();
        let err = agg
            .aggregate_event(&event(indexmap! {
                "uuid".to_string() => Value::Str("a".to_string()),
                "long_name".to_string() => Value::Int(1),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::MalformedField { field: "long_name", expected: "a string" }
        );
    }
}
