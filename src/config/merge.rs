//! Deep merge of configuration tiers.
//!
//! Higher tiers override lower tiers key by key; only the leaves a tier
//! actually sets are replaced.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively
/// - Scalars and arrays in `overlay` replace `base`
/// - A null in `overlay` means "not specified" and keeps `base`
///
/// # Example
/// ```
/// use serde_json::json;
/// use license_import::config::deep_merge;
///
/// let defaults = json!({ "input": { "delimiter": ";", "null_marker": "null" } });
/// let project = json!({ "input": { "delimiter": "," } });
/// let merged = deep_merge(defaults, project);
/// assert_eq!(merged, json!({ "input": { "delimiter": ",", "null_marker": "null" } }));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, later tiers winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
