//! Event normalization (§4.C): a pure function from one raw event to a
//! proposed per-task update.

use eventflow_types::{RawEvent, ValueMap};

use crate::error::PolicyError;
use crate::registry::FieldPolicyRegistry;

/// Compute the proposed update for `event`: copy fields verbatim, then
/// apply each transform whose trigger field is present, overwriting any
/// colliding key the copy step set.
pub fn normalize(event: &RawEvent, registry: &FieldPolicyRegistry) -> Result<ValueMap, PolicyError> {
    let mut proposed = ValueMap::new();

    for field in registry.copy_fields() {
        if let Some(value) = event.get(field) {
            proposed.insert(field.to_string(), value.clone());
        }
    }

    for (field, transform) in registry.transforms() {
        if event.contains_key(field) {
            let update = transform.apply(event)?;
            proposed.extend(update);
        }
    }

    Ok(proposed)
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
    fn copies_plain_fields_verbatim() {
        let event = RawEvent(indexmap! {
            "uuid".to_string() => Value::Str("abc".to_string()),
            "retries".to_string() => Value::Int(2),
        });
        let proposed = normalize(&event, &registry()).unwrap();
        assert_eq!(proposed.get("uuid"), Some(&Value::Str("abc".to_string())));
        assert_eq!(proposed.get("retries"), Some(&Value::Int(2)));
    }

    #[test]
    fn transform_overwrites_copied_value() {
        let event = RawEvent(indexmap! {
            "uuid".to_string() => Value::Str("abc".to_string()),
            "type".to_string() => Value::Str("task-started".to_string()),
        });
        let proposed = normalize(&event, &registry()).unwrap();
        assert_eq!(proposed.get("type"), Some(&Value::Str("task-started".to_string())));
        assert_eq!(proposed.get("state"), Some(&Value::Str("task-started".to_string())));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let event = RawEvent(indexmap! {
            "uuid".to_string() => Value::Str("abc".to_string()),
            "something_unrecognized".to_string() => Value::Bool(true),
        });
        let proposed = normalize(&event, &registry()).unwrap();
        assert!(!proposed.contains_key("something_unrecognized"));
    }

    #[test]
    fn malformed_transform_field_propagates_error() {
        let event = RawEvent(indexmap! {
            "uuid".to_string() => Value::Str("abc".to_string()),
            "long_name".to_string() => Value::Int(1),
        });
        assert!(normalize(&event, &registry()).is_err());
    }
}
