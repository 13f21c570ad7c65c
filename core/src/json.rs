//! Pretty-printing of JSON response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Re-indents `text` with four spaces. With `sort`, object keys are
/// ordered recursively; otherwise document order is kept.
pub fn beautify_json(text: &str, sort: bool) -> Result<String, ApiError> {
    let mut value: Value = serde_json::from_str(text)?;
    if sort {
        sort_keys(&mut value);
    }
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}
