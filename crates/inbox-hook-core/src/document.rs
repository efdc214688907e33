//! Optional-field extraction over loosely typed JSON documents.
//!
//! Provider payloads are not validated against a schema. Every accessor here
//! returns `None` when a path segment is missing or the value has an
//! unexpected JSON type, so callers degrade to [`PLACEHOLDER`] instead of
//! failing.

use serde_json::Value;

/// Rendered in summaries when a field is absent.
pub const PLACEHOLDER: &str = "unknown";

/// Traverse a dot-separated path of object keys.
///
/// Example: `lookup(&json, "data.object.subject")` returns
/// `&json["data"]["object"]["subject"]`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Non-empty string at `path`.
pub fn str_at<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    lookup(value, path)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Integer at `path`. Floats and strings are not coerced.
pub fn i64_at(value: &Value, path: &str) -> Option<i64> {
    let node = lookup(value, path)?;
    node.as_i64()
        .or_else(|| node.as_u64().and_then(|n| i64::try_from(n).ok()))
}

/// Boolean at `path`.
pub fn bool_at(value: &Value, path: &str) -> Option<bool> {
    lookup(value, path).and_then(Value::as_bool)
}

/// Array at `path`.
pub fn array_at<'a>(value: &'a Value, path: &str) -> Option<&'a [Value]> {
    lookup(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

/// Render an optional value, falling back to [`PLACEHOLDER`].
pub fn or_placeholder<S: Into<String>>(value: Option<S>) -> String {
    value
        .map(Into::into)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
