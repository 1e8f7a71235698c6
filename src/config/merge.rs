//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower ones key by key. Arrays and scalars are replaced
//! whole.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge recursively. A null in `overlay` means "not specified" and
/// keeps the base value.
///
/// ```
/// use serde_json::json;
/// use shiftlist::config::deep_merge;
///
/// let defaults = json!({ "lifecycle": { "expiry_hour": 4, "max_batch": 1000 } });
/// let project = json!({ "lifecycle": { "expiry_hour": 5 } });
/// assert_eq!(
///     deep_merge(defaults, project),
///     json!({ "lifecycle": { "expiry_hour": 5, "max_batch": 1000 } })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold [`deep_merge`] over tiers given lowest priority first.
pub fn deep_merge_all(tiers: impl IntoIterator<Item = Value>) -> Value {
    tiers.into_iter().fold(Value::Null, deep_merge)
}
