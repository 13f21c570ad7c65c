//! POST body synthesis.
//!
//! # Design
//! The target API accepts only flat form fields. A body is assembled fresh
//! for every invocation from a private copy of the call's template, in a
//! fixed order:
//!
//! 1. scalar template defaults (the template's own `data` flag is never sent)
//! 2. `token`
//! 3. the `data` payload, only when the template declares the call writable
//! 4. ad-hoc overrides from `adhoc_redcap_options`: scalars are set
//!    directly, sequence values re-declare that key a list parameter, and
//!    `data` and `token` entries are ignored
//! 5. list expansion: every list parameter with a same-named sequence
//!    argument becomes `key[0]`, `key[1]`, ...; a bare list is never sent
//!
//! Overrides run before expansion so a caller can turn a scalar parameter
//! into a list target without editing the version file.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::definition::{CallTemplate, TemplateValue, DATA_KEY};
use crate::error::ApiError;

/// Reserved keyword carrying per-invocation template overrides.
pub const ADHOC_OPTIONS_KEY: &str = "adhoc_redcap_options";

/// Field name of the authentication token.
pub const TOKEN_KEY: &str = "token";

/// Arguments for one invocation of a generated operation.
///
/// ```
/// use cappy_core::CallArgs;
///
/// let args = CallArgs::new()
///     .arg("records", vec![1, 2])
///     .adhoc("type", "eav");
/// assert!(args.data.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Opaque payload, sent only to calls that accept one.
    pub data: Option<String>,
    /// Keyword arguments. Sequence values feed list expansion; the
    /// `adhoc_redcap_options` entry carries overrides.
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Adds one entry to `adhoc_redcap_options`, replacing a non-mapping
    /// value previously stored there.
    pub fn adhoc(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let slot = self
            .kwargs
            .entry(ADHOC_OPTIONS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(options) = slot {
            options.insert(key.into(), value.into());
        }
        self
    }

    /// The payload, if one was supplied and is non-empty.
    pub fn payload(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }
}

/// Flat, ordered form fields for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PostBody {
    fields: IndexMap<String, Value>,
}

impl PostBody {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of the body with the payload removed.
    pub fn without_data(&self) -> PostBody {
        let mut copy = self.clone();
        copy.fields.shift_remove(DATA_KEY);
        copy
    }

    /// Fields rendered as form strings, in insertion order.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), form_value(v)))
            .collect()
    }

    fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    fn remove(&mut self, key: &str) {
        self.fields.shift_remove(key);
    }
}

/// String form of a field value: strings verbatim, null as empty, nested
/// values as compact JSON.
pub fn form_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the POST body for one invocation of `call` from its template.
///
/// A payload sent to a read-only call is dropped here; callers that want
/// to reject it must check `CallTemplate::accepts_data` first.
pub fn build_body(
    call: &str,
    token: &str,
    data: Option<&str>,
    template: &CallTemplate,
    kwargs: &Map<String, Value>,
) -> Result<PostBody, ApiError> {
    let mut template = template.clone();
    let mut body = PostBody::default();

    for (key, value) in template.iter() {
        if let TemplateValue::Scalar(v) = value {
            if key != DATA_KEY {
                body.insert(key, v.clone());
            }
        }
    }

    body.insert(TOKEN_KEY, Value::String(token.to_string()));

    if let Some(payload) = data.filter(|d| !d.is_empty()) {
        if template.accepts_data() {
            body.insert(DATA_KEY, Value::String(payload.to_string()));
        } else {
            tracing::warn!(call, "dropping data payload sent to read-only call");
        }
    }

    if let Some(adhoc) = kwargs.get(ADHOC_OPTIONS_KEY) {
        let Value::Object(options) = adhoc else {
            return Err(ApiError::InvalidAdhocOptions {
                call: call.to_string(),
            });
        };
        for (key, value) in options {
            if key == DATA_KEY || key == TOKEN_KEY {
                tracing::debug!(call, key = %key, "ignoring reserved ad-hoc override");
                continue;
            }
            if value.is_array() {
                template.mark_list(key);
            } else {
                body.insert(key.as_str(), value.clone());
            }
        }
    }

    for (key, value) in template.iter() {
        if !value.is_list() || key == TOKEN_KEY {
            continue;
        }
        body.remove(key);
        if let Some(Value::Array(items)) = kwargs.get(key) {
            for (index, item) in items.iter().enumerate() {
                body.insert(format!("{key}[{index}]"), item.clone());
            }
        }
    }

    for key in kwargs.keys() {
        if key != ADHOC_OPTIONS_KEY && !template.get(key).is_some_and(TemplateValue::is_list) {
            tracing::debug!(call, arg = %key, "ignoring argument that is not a list parameter");
        }
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "F53EA8B9D58456B722945F4B274E6B4C";

    fn template(value: Value) -> CallTemplate {
        serde_json::from_value(value).unwrap()
    }

    fn body_json(body: &PostBody) -> Value {
        serde_json::to_value(body).unwrap()
    }

    #[test]
    fn list_argument_expands_to_indexed_fields() {
        let t = template(json!({"data": true, "records": ["records"]}));
        let args = CallArgs::new().arg("records", vec![1, 2]);
        let body = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert_eq!(
            body_json(&body),
            json!({"token": TOKEN, "records[0]": 1, "records[1]": 2})
        );
    }

    #[test]
    fn missing_list_argument_leaves_no_field() {
        let t = template(json!({"data": false, "forms": ["forms"], "format": "json"}));
        let body = build_body("export_metadata", TOKEN, None, &t, &Map::new()).unwrap();
        assert!(!body.contains_key("forms"));
        assert!(!body.iter().any(|(k, _)| k.starts_with("forms[")));
        assert_eq!(body.get("format"), Some(&json!("json")));
    }

    #[test]
    fn expansion_uses_key_not_alias() {
        let t = template(json!({"data": false, "fields": ["field_names"]}));
        let args = CallArgs::new().arg("fields", vec!["age", "sex"]);
        let body = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert_eq!(body.get("fields[0]"), Some(&json!("age")));
        assert_eq!(body.get("fields[1]"), Some(&json!("sex")));
        assert!(!body.iter().any(|(k, _)| k.starts_with("field_names")));
    }

    #[test]
    fn payload_reaches_writable_call() {
        let t = template(json!({"data": true, "content": "record"}));
        let body = build_body("import_records", TOKEN, Some("[{}]"), &t, &Map::new()).unwrap();
        assert_eq!(body.get("data"), Some(&json!("[{}]")));
    }

    #[test]
    fn payload_is_dropped_for_read_only_call() {
        let t = template(json!({"data": false, "content": "record"}));
        let body = build_body("export_records", TOKEN, Some("[{}]"), &t, &Map::new()).unwrap();
        assert!(!body.contains_key("data"));
    }

    #[test]
    fn writable_call_without_payload_has_no_data_field() {
        let t = template(json!({"data": true, "content": "record"}));
        let body = build_body("import_records", TOKEN, None, &t, &Map::new()).unwrap();
        assert!(!body.contains_key("data"));
        let body = build_body("import_records", TOKEN, Some(""), &t, &Map::new()).unwrap();
        assert!(!body.contains_key("data"));
    }

    #[test]
    fn adhoc_scalar_overrides_default() {
        let t = template(json!({"data": false, "type": "flat"}));
        let args = CallArgs::new().adhoc("type", "eav");
        let body = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert_eq!(body_json(&body), json!({"type": "eav", "token": TOKEN}));
    }

    #[test]
    fn adhoc_data_is_ignored() {
        let t = template(json!({"data": true}));
        let args = CallArgs::new().adhoc("data", "smuggled");
        let body = build_body("import_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert!(!body.contains_key("data"));
    }

    #[test]
    fn adhoc_cannot_replace_or_remove_token() {
        let t = template(json!({"data": false, "content": "version"}));
        for override_value in [json!([]), json!("other")] {
            let args = CallArgs::new().adhoc("token", override_value.clone());
            let body = build_body("export_version", TOKEN, None, &t, &args.kwargs).unwrap();
            assert_eq!(
                body_json(&body),
                json!({"content": "version", "token": TOKEN}),
                "token override {override_value}"
            );
        }
    }

    #[test]
    fn list_typed_token_in_template_keeps_token() {
        let t = template(json!({"data": false, "token": ["token"]}));
        let args = CallArgs::new().arg("token", vec!["a", "b"]);
        let body = build_body("export_version", TOKEN, None, &t, &args.kwargs).unwrap();
        assert_eq!(body_json(&body), json!({"token": TOKEN}));
    }

    #[test]
    fn adhoc_sequence_declares_list_parameter() {
        let t = template(json!({"data": false, "events": "baseline"}));
        let args = CallArgs::new()
            .adhoc("events", Vec::<Value>::new())
            .arg("events", vec!["baseline", "month_1"]);
        let body = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert!(!body.contains_key("events"));
        assert_eq!(body.get("events[0]"), Some(&json!("baseline")));
        assert_eq!(body.get("events[1]"), Some(&json!("month_1")));
    }

    #[test]
    fn adhoc_sequence_without_argument_removes_default() {
        let t = template(json!({"data": false, "events": "baseline"}));
        let args = CallArgs::new().adhoc("events", vec!["ignored"]);
        let body = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert!(!body.contains_key("events"));
        assert!(!body.contains_key("events[0]"));
    }

    #[test]
    fn adhoc_must_be_a_mapping() {
        let t = template(json!({"data": false}));
        let args = CallArgs::new().arg(ADHOC_OPTIONS_KEY, "type=eav");
        let err = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap_err();
        assert!(matches!(err, ApiError::InvalidAdhocOptions { .. }));
    }

    #[test]
    fn scalar_argument_for_scalar_key_is_ignored() {
        let t = template(json!({"data": false, "format": "json"}));
        let args = CallArgs::new().arg("format", "csv");
        let body = build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert_eq!(body.get("format"), Some(&json!("json")));
    }

    #[test]
    fn template_is_not_mutated() {
        let t = template(json!({"data": false, "events": "baseline"}));
        let before = t.clone();
        let args = CallArgs::new().adhoc("events", vec!["x"]);
        build_body("export_records", TOKEN, None, &t, &args.kwargs).unwrap();
        assert_eq!(t, before);
    }

    #[test]
    fn token_overrides_template_token() {
        let t = template(json!({"data": false, "token": "stale"}));
        let body = build_body("export_version", TOKEN, None, &t, &Map::new()).unwrap();
        assert_eq!(body.get("token"), Some(&json!(TOKEN)));
    }

    #[test]
    fn without_data_strips_payload_only() {
        let t = template(json!({"data": true, "content": "record"}));
        let body = build_body("import_records", TOKEN, Some("x"), &t, &Map::new()).unwrap();
        let stripped = body.without_data();
        assert!(!stripped.contains_key("data"));
        assert_eq!(stripped.len(), body.len() - 1);
    }

    #[test]
    fn form_values_render_flat() {
        assert_eq!(form_value(&json!("flat")), "flat");
        assert_eq!(form_value(&json!(2)), "2");
        assert_eq!(form_value(&json!(false)), "false");
        assert_eq!(form_value(&Value::Null), "");
        assert_eq!(form_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn adhoc_replaces_non_mapping_slot() {
        let args = CallArgs::new().arg(ADHOC_OPTIONS_KEY, 3).adhoc("type", "eav");
        assert_eq!(args.kwargs[ADHOC_OPTIONS_KEY], json!({"type": "eav"}));
    }
}
