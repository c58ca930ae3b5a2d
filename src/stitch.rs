//! Deep merge of schema documents.
//!
//! Used to flatten `allOf` and to reassemble documents from fragments.

use serde_json::Value;
use tracing::trace;

/// Merge `update` into `target` in place.
///
/// For every key of `update`:
/// - absent from `target`: copied;
/// - object on both sides: merged recursively;
/// - array on both sides: elements of `update` not already present in
///   `target`'s original elements are appended, in order;
/// - otherwise: the `update` value wins.
///
/// When either side is not an object the whole `target` is replaced, except
/// that two arrays follow the append rule above.
pub fn merge(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target), Value::Object(update)) => {
            for (key, value) in update {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(update)) => {
            let original_len = target.len();
            for value in update {
                if !target[..original_len].contains(value) {
                    target.push(value.clone());
                }
            }
        }
        (target, update) => {
            if target != update {
                trace!(from = %target, to = %update, "merge conflict, update wins");
            }
            *target = update.clone();
        }
    }
}

/// Fold `instances` left to right over a copy of the first one.
///
/// Returns `None` for an empty slice.
pub fn merge_all(instances: &[Value]) -> Option<Value> {
    let (first, rest) = instances.split_first()?;
    let mut merged = first.clone();
    for instance in rest {
        merge(&mut merged, instance);
    }
    Some(merged)
}
