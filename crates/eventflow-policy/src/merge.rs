//! Value-type-aware recursive merge (§4.B).

use eventflow_types::{Value, ValueMap};

/// Merge two values of the same logical field according to their shape:
/// maps recurse, sequences concatenate (`b` after `a`), sets union with
/// dedup by equality, and scalars resolve to `b` on conflict (`a` if the
/// two are equal).
///
/// Mismatched shapes (e.g. a sequence colliding with a map) are treated as
/// a scalar conflict: `b` wins. This can only happen if a merge field's
/// producers disagree on its type, which the field policy table doesn't
/// guard against by construction.
pub fn merge_values(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Map(ma), Value::Map(mb)) => Value::Map(merge_maps(ma, mb)),
        (Value::Seq(sa), Value::Seq(sb)) => {
            let mut merged = sa.clone();
            merged.extend(sb.iter().cloned());
            Value::Seq(merged)
        }
        (Value::Set(sa), Value::Set(sb)) => {
            let mut merged = sa.clone();
            for v in sb {
                if !merged.contains(v) {
                    merged.push(v.clone());
                }
            }
            Value::Set(merged)
        }
        _ if a == b => a.clone(),
        _ => b.clone(),
    }
}

/// Merge two maps key-by-key: keys in only one operand pass through
/// unchanged, keys in both recurse into [`merge_values`].
pub fn merge_maps(a: &ValueMap, b: &ValueMap) -> ValueMap {
    let mut out = a.clone();
    for (k, bv) in b {
        match out.get(k) {
            Some(av) => {
                let merged = merge_values(av, bv);
                out.insert(k.clone(), merged);
            }
            None => {
                out.insert(k.clone(), bv.clone());
            }
        }
    }
    out
}

/// Restrict a map to a named subset of keys, dropping everything else.
///
/// Used to scope `deep_merge` to `merge_fields` (§4.D step 3) so fields
/// outside that set never participate in merge semantics.
pub fn restrict(map: &ValueMap, fields: &std::collections::HashSet<String>) -> ValueMap {
    map.iter()
        .filter(|(k, _)| fields.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
