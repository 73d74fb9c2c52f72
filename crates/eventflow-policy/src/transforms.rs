//! Pure per-field transforms: functions from a whole event to a partial
//! update of the task record, used to rename or synthesize fields.
//!
//! Re-expresses the source system's dict of lambdas as an interface with a
//! single `apply` method (§9 of the design notes), so each transform is a
//! small, independently testable struct instead of a closure captured in a
//! table literal.

use std::sync::Arc;

use eventflow_types::{canonicalize_event_type, RawEvent, RunstateVocabulary, TaskColumn, Value, ValueMap};

use crate::error::PolicyError;

/// A pure function from an entire event to a partial task-record update.
///
/// Implementations must not look at anything but the event: no store
/// access, no clock, no randomness. That's what keeps the normalizer
/// (§4.C) a pure function overall.
pub trait FieldTransform: Send + Sync {
    /// Compute the partial update this transform contributes, given that
    /// its trigger field is present on `event`.
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError>;
}

fn expect_str<'a>(event: &'a RawEvent, field: &'static str) -> Result<&'a str, PolicyError> {
    event
        .get(field)
        .and_then(Value::as_str)
        .ok_or(PolicyError::MalformedField { field, expected: "a string" })
}

/// Last path segment of a dotted name, e.g. `"pkg.mod.MyTask"` → `"MyTask"`.
fn last_segment(s: &str) -> &str {
    s.rsplit('.').next().unwrap_or(s)
}

/// The `type` transform: synthesizes `state` + an appended `states` entry
/// for state-bearing event types, canonicalizing `firex-revoke-complete`
/// onto `task-revoked` so it can never be overridden by a later event of
/// the same canonical state.
pub struct TypeTransform {
    run_state_event_types: std::collections::HashSet<String>,
}

impl TypeTransform {
    /// Build a `type` transform bound to a specific run-state vocabulary.
    ///
    /// `run_state_event_types` is precomputed here, once, rather than
    /// rebuilt by [`FieldTransform::apply`] on every event.
    pub fn new(vocabulary: Arc<RunstateVocabulary>) -> Self {
        Self { run_state_event_types: vocabulary.run_state_event_types() }
    }
}

impl FieldTransform for TypeTransform {
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError> {
        let event_type = expect_str(event, "type")?;
        let mut update = ValueMap::new();

        if self.run_state_event_types.contains(event_type) {
            let state = canonicalize_event_type(event_type).to_string();

            let mut states_entry = ValueMap::new();
            states_entry.insert(TaskColumn::State.to_string(), Value::Str(state.clone()));
            states_entry.insert(
                "timestamp".to_string(),
                event.get("timestamp").cloned().unwrap_or(Value::Null),
            );

            update.insert(TaskColumn::State.to_string(), Value::Str(state));
            update.insert(
                TaskColumn::States.to_string(),
                Value::Seq(vec![Value::Map(states_entry)]),
            );
        }

        Ok(update)
    }
}

/// The `long_name` transform: derives `name` as the last dotted segment of
/// `long_name`.
pub struct LongNameTransform;

impl FieldTransform for LongNameTransform {
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError> {
        let long_name = expect_str(event, "long_name")?;
        let mut update = ValueMap::new();
        update.insert(TaskColumn::Name.to_string(), Value::Str(last_segment(long_name).to_string()));
        Ok(update)
    }
}

/// The `name` transform: derives both `name` (last segment) and
/// `long_name` (full value) from a bare dotted `name` field.
///
/// The upstream producer should send `long_name` directly, since this
/// transform will overwrite `name` copied verbatim by the `copy` policy;
/// kept for compatibility with producers that only send `name`.
pub struct NameTransform;

impl FieldTransform for NameTransform {
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError> {
        let name = expect_str(event, "name")?;
        let mut update = ValueMap::new();
        update.insert(TaskColumn::Name.to_string(), Value::Str(last_segment(name).to_string()));
        update.insert(TaskColumn::LongName.to_string(), Value::Str(name.to_string()));
        Ok(update)
    }
}

/// The `url` transform: renames `url` to `logs_url` for backwards
/// compatibility with producers that haven't switched to `log_filepath`.
pub struct UrlTransform;

impl FieldTransform for UrlTransform {
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError> {
        let url = event.get("url").cloned().unwrap_or(Value::Null);
        let mut update = ValueMap::new();
        update.insert(TaskColumn::LogsUrl.to_string(), url);
        Ok(update)
    }
}

/// The `log_filepath` transform: renames `log_filepath` to `logs_url`.
pub struct LogFilepathTransform;

impl FieldTransform for LogFilepathTransform {
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError> {
        let path = event.get("log_filepath").cloned().unwrap_or(Value::Null);
        let mut update = ValueMap::new();
        update.insert(TaskColumn::LogsUrl.to_string(), path);
        Ok(update)
    }
}

/// The `local_received` transform: derives `first_started`. Combined with
/// `first_started` being a keep-initial field, this value is never
/// overwritten once set.
pub struct LocalReceivedTransform;

impl FieldTransform for LocalReceivedTransform {
    fn apply(&self, event: &RawEvent) -> Result<ValueMap, PolicyError> {
        let received = event.get("local_received").cloned().unwrap_or(Value::Null);
        let mut update = ValueMap::new();
        update.insert(TaskColumn::FirstStarted.to_string(), received);
        Ok(update)
    }
}
