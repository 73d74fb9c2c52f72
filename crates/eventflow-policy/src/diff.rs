//! Change detection (§4.D): the delta between an existing task record and
//! a proposed update.

use eventflow_types::ValueMap;

use crate::merge::{merge_maps, restrict};
use crate::registry::FieldPolicyRegistry;

/// Compute the delta to apply to `task` given a `proposed` update,
/// honoring `registry`'s merge and keep-initial fields.
///
/// Ties between branches (a key produced by more than one) resolve
/// merge-after-keep-initial-after-overwrite, though the field table
/// partitions keys such that this only matters if a caller-supplied
/// registry overlaps the three sets.
pub fn diff(task: &ValueMap, proposed: &ValueMap, registry: &FieldPolicyRegistry) -> ValueMap {
    let keep_initial_fields = registry.keep_initial_fields();
    let merge_fields = registry.merge_fields();

    let mut delta = ValueMap::new();

    // Step 1: overwrite fields outside keep-initial/merge.
    for (k, v) in proposed {
        if keep_initial_fields.contains(k) || merge_fields.contains(k) {
            continue;
        }
        if task.get(k) != Some(v) {
            delta.insert(k.clone(), v.clone());
        }
    }

    // Step 2: keep-initial fields only write if the task has no value yet.
    for k in &keep_initial_fields {
        if let Some(v) = proposed.get(k) {
            if !task.contains_key(k) {
                delta.insert(k.clone(), v.clone());
            }
        }
    }

    // Step 3: merge fields.
    let task_restricted = restrict(task, &merge_fields);
    let proposed_restricted = restrict(proposed, &merge_fields);
    let merged = merge_maps(&task_restricted, &proposed_restricted);
    for (k, v) in &merged {
        if task.get(k) != Some(v) {
            delta.insert(k.clone(), v.clone());
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventflow_types::{RunstateVocabulary, Value};
    use indexmap::indexmap;
    use std::sync::Arc;

    fn registry() -> FieldPolicyRegistry {
        FieldPolicyRegistry::default_for(Arc::new(RunstateVocabulary::canonical()))
    }

    #[test]
    fn unchanged_overwrite_field_is_omitted() {
        let task = indexmap! { "retries".to_string() => Value::Int(1) };
        let proposed = indexmap! { "retries".to_string() => Value::Int(1) };
        let delta = diff(&task, &proposed, &registry());
        assert!(delta.is_empty());
    }

    #[test]
    fn changed_overwrite_field_is_included() {
        let task = indexmap! { "retries".to_string() => Value::Int(1) };
        let proposed = indexmap! { "retries".to_string() => Value::Int(2) };
        let delta = diff(&task, &proposed, &registry());
        assert_eq!(delta.get("retries"), Some(&Value::Int(2)));
    }

    #[test]
    fn keep_initial_field_only_writes_once() {
        let task = indexmap! { "first_started".to_string() => Value::Float(1.0) };
        let proposed = indexmap! { "first_started".to_string() => Value::Float(99.0) };
        let delta = diff(&task, &proposed, &registry());
        assert!(!delta.contains_key("first_started"));

        let empty_task = ValueMap::new();
        let delta = diff(&empty_task, &proposed, &registry());
        assert_eq!(delta.get("first_started"), Some(&Value::Float(99.0)));
    }

    #[test]
    fn merge_field_accumulates_states() {
        let task = indexmap! {
            "states".to_string() => Value::Seq(vec![Value::Str("task-received".to_string())]),
        };
        let proposed = indexmap! {
            "states".to_string() => Value::Seq(vec![Value::Str("task-started".to_string())]),
        };
        let delta = diff(&task, &proposed, &registry());
        assert_eq!(
            delta.get("states"),
            Some(&Value::Seq(vec![
                Value::Str("task-received".to_string()),
                Value::Str("task-started".to_string())
            ]))
        );
    }
}
