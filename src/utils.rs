use serde_json::Value;

/// Case-folds and trims a phrase so it can be compared across documents.
pub fn normalize_phrase(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Coerces a scalar JSON value to text. Objects, arrays and nulls have no
/// textual form here and yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like [`scalar_text`] but treats blank strings as missing.
pub fn non_empty_text(value: &Value) -> Option<String> {
    scalar_text(value).filter(|s| !s.trim().is_empty())
}

/// Drops JSON nulls so that `"priority": null` and a missing key mean the same thing.
pub fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// Equality for priorities. Numbers compare by value (`1 == 1.0`), every
/// other pair must match exactly, so `"1"` and `1` differ.
pub fn values_equal(a: &Option<Value>, b: &Option<Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Renders an optional scalar the way it is shown in report comments:
/// strings without quotes, absent values as `null`.
pub fn display_value(value: &Option<Value>) -> String {
    match value {
        None => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Joins at most `limit` items with `", "`, appending `...` if anything was cut.
pub fn preview(items: &[String], limit: usize) -> String {
    let mut text = items
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > limit {
        text.push_str("...");
    }
    text
}
