//! State trees and the shape predicates used by the reconciler.

use serde_json::{Map, Value};

/// A state tree: top-level keys map to independent reducer slices.
///
/// Only the first level is significant to rehydration. Values below it are
/// treated as opaque JSON.
pub type State = Map<String, Value>;

/// Returns `true` if `value` may be shallow-merged with another value.
///
/// Only JSON objects qualify. Arrays, `null` and primitives are always
/// overwritten wholesale.
pub fn is_plain_enough(value: &Value) -> bool {
    as_plain(value).is_some()
}

/// The fields of `value` if it is plain enough to shallow-merge.
pub fn as_plain(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(fields) => Some(fields),
        _ => None,
    }
}

/// Returns `true` for values that carry structure (objects and arrays).
pub fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Returns `true` for `null`, `false`, numeric zero and the empty string.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Shallow-merge `overlay` on top of `base`.
///
/// Every top-level field of `overlay` replaces the field of the same name in
/// `base`; fields only present in `base` are kept.
///
/// # Example
///
/// ```
/// use rehydrate_kit::shallow_merge;
/// use serde_json::json;
///
/// let base = json!({ "theme": "dark", "lang": "en" });
/// let overlay = json!({ "lang": "es" });
///
/// let merged = shallow_merge(
///     base.as_object().unwrap(),
///     overlay.as_object().unwrap(),
/// );
/// assert_eq!(serde_json::Value::Object(merged), json!({ "theme": "dark", "lang": "es" }));
/// ```
pub fn shallow_merge(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (field, value) in overlay {
        merged.insert(field.clone(), value.clone());
    }
    merged
}
