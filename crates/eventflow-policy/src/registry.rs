//! The field policy registry (§4.A): a precomputed configuration value
//! derived from the canonical field table (§6) plus a [`RunstateVocabulary`].

use std::collections::HashSet;
use std::sync::Arc;

use eventflow_types::{RunstateVocabulary, TaskColumn};
use indexmap::IndexMap;

use crate::transforms::{
    FieldTransform, LocalReceivedTransform, LogFilepathTransform, LongNameTransform, NameTransform,
    TypeTransform, UrlTransform,
};

/// Per-field behavior flags, precomputed from the declarative table.
///
/// Any field may combine `copy` with a transform (the transform runs
/// after the copy and may overwrite it, §4.A), or stand alone as a merge
/// or keep-initial field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldPolicySpec {
    /// Copy the field verbatim from the event into the proposed update.
    pub copy: bool,
    /// Merge this field's value into the existing one rather than
    /// overwriting (§4.B/§4.D).
    pub merge: bool,
    /// Only write this field if the task does not already have a value
    /// for it (§4.D step 2).
    pub keep_initial: bool,
}

/// The effective, precomputed aggregator configuration: which fields are
/// copied, merged, or keep-initial, and which transforms apply to which
/// trigger field.
pub struct FieldPolicyRegistry {
    specs: IndexMap<String, FieldPolicySpec>,
    transforms: IndexMap<String, Arc<dyn FieldTransform>>,
}

impl FieldPolicyRegistry {
    /// Build the canonical field policy table (§6) bound to `vocabulary`.
    pub fn default_for(vocabulary: Arc<RunstateVocabulary>) -> Self {
        let mut specs = IndexMap::new();

        const COPY_ONLY: &[TaskColumn] = &[
            TaskColumn::Uuid,
            TaskColumn::Hostname,
            TaskColumn::ParentId,
            TaskColumn::Retries,
            TaskColumn::BoundArgs,
            TaskColumn::DefaultBoundArgs,
            TaskColumn::ActualRuntime,
            TaskColumn::Utcoffset,
            TaskColumn::FromPlugin,
            TaskColumn::Results,
            TaskColumn::Traceback,
            TaskColumn::Exception,
            TaskColumn::ChainDepth,
            TaskColumn::ExceptionCauseUuid,
        ];
        for field in COPY_ONLY {
            specs.insert(field.to_string(), FieldPolicySpec { copy: true, ..Default::default() });
        }

        specs.insert("type".to_string(), FieldPolicySpec { copy: true, ..Default::default() });
        specs.insert("long_name".to_string(), FieldPolicySpec { copy: true, ..Default::default() });
        specs.insert("name".to_string(), FieldPolicySpec::default());
        specs.insert(
            TaskColumn::FirstStarted.to_string(),
            FieldPolicySpec { keep_initial: true, ..Default::default() },
        );
        specs.insert(
            TaskColumn::States.to_string(),
            FieldPolicySpec { merge: true, ..Default::default() },
        );
        specs.insert("url".to_string(), FieldPolicySpec::default());
        specs.insert("log_filepath".to_string(), FieldPolicySpec::default());
        specs.insert("local_received".to_string(), FieldPolicySpec::default());

        let mut transforms: IndexMap<String, Arc<dyn FieldTransform>> = IndexMap::new();
        transforms.insert("type".to_string(), Arc::new(TypeTransform::new(vocabulary)));
        transforms.insert("long_name".to_string(), Arc::new(LongNameTransform));
        transforms.insert("name".to_string(), Arc::new(NameTransform));
        transforms.insert("url".to_string(), Arc::new(UrlTransform));
        transforms.insert("log_filepath".to_string(), Arc::new(LogFilepathTransform));
        transforms.insert("local_received".to_string(), Arc::new(LocalReceivedTransform));

        Self { specs, transforms }
    }

    /// Field names copied verbatim from the event.
    pub fn copy_fields(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().filter(|(_, s)| s.copy).map(|(k, _)| k.as_str())
    }

    /// Field names merged rather than overwritten.
    pub fn merge_fields(&self) -> HashSet<String> {
        self.specs.iter().filter(|(_, s)| s.merge).map(|(k, _)| k.clone()).collect()
    }

    /// Field names only written on first observation.
    pub fn keep_initial_fields(&self) -> HashSet<String> {
        self.specs.iter().filter(|(_, s)| s.keep_initial).map(|(k, _)| k.clone()).collect()
    }

    /// The transform registered for `field`, if any.
    pub fn transform_for(&self, field: &str) -> Option<&Arc<dyn FieldTransform>> {
        self.transforms.get(field)
    }

    /// All `(field, transform)` pairs, in registration order.
    pub fn transforms(&self) -> impl Iterator<Item = (&str, &Arc<dyn FieldTransform>)> {
        self.transforms.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_is_a_merge_field_not_a_copy_field() {
        let registry = FieldPolicyRegistry::default_for(Arc::new(RunstateVocabulary::canonical()));
        assert!(registry.merge_fields().contains("states"));
        assert!(!registry.copy_fields().any(|f| f == "states"));
    }

    #[test]
    fn first_started_is_keep_initial() {
        let registry = FieldPolicyRegistry::default_for(Arc::new(RunstateVocabulary::canonical()));
        assert!(registry.keep_initial_fields().contains("first_started"));
    }

    #[test]
    fn uuid_is_copy_only_no_transform() {
        let registry = FieldPolicyRegistry::default_for(Arc::new(RunstateVocabulary::canonical()));
        assert!(registry.copy_fields().any(|f| f == "uuid"));
        assert!(registry.transform_for("uuid").is_none());
    }

    #[test]
    fn type_is_copy_and_transform() {
        let registry = FieldPolicyRegistry::default_for(Arc::new(RunstateVocabulary::canonical()));
        assert!(registry.copy_fields().any(|f| f == "type"));
        assert!(registry.transform_for("type").is_some());
    }
}
