use serde_json::Value as JsonValue;

/// Process and step data: a JSON object keyed by field name.
pub type Record = serde_json::Map<String, JsonValue>;

/// Resolve a dotted path (`address.city`) against a record.
pub fn lookup_path<'a>(record: &'a Record, path: &str) -> Option<&'a JsonValue> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = record.get(first)?;
    for part in parts {
        current = match current {
            JsonValue::Object(map) => map.get(part)?,
            JsonValue::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Render a JSON value the way expressions see it: strings verbatim, `null`
/// as the empty string, everything else as compact JSON.
pub fn value_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Merge `source` into `target` field by field, restricted to `allowed`.
///
/// Returns the names of the fields that were written. Fields are only ever
/// added or overwritten, never removed.
pub fn merge_fields(target: &mut Record, source: &Record, allowed: &[String]) -> Vec<String> {
    let mut written = Vec::new();
    for (key, value) in source {
        if allowed.iter().any(|a| a == key) {
            target.insert(key.clone(), value.clone());
            written.push(key.clone());
        }
    }
    written
}
