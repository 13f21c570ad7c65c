//! Call definitions loaded from a version file.
//!
//! # Design
//! A version file maps call names to templates of default POST fields. Each
//! template entry is classified exactly once, at load time, into a
//! `TemplateValue`: sequences mark a list parameter that is expanded into
//! indexed fields at call time, anything else is a scalar default. Callers
//! never inspect raw value shapes after loading.
//!
//! Some version files wrap the call mapping under an `api_def` key; both
//! forms are accepted.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Wrapper key some version files use around the call mapping.
pub const WRAPPER_KEY: &str = "api_def";

/// Template key holding the "accepts a payload" flag.
pub const DATA_KEY: &str = "data";

/// One template entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum TemplateValue {
    /// A literal default sent as-is.
    Scalar(Value),
    /// A list parameter with its placeholder elements. Expansion always
    /// uses the template key as the field prefix.
    List(Vec<Value>),
}

impl TemplateValue {
    pub fn is_list(&self) -> bool {
        matches!(self, TemplateValue::List(_))
    }

    /// First placeholder element of a list parameter, when it is a string.
    pub fn alias(&self) -> Option<&str> {
        match self {
            TemplateValue::List(items) => items.first().and_then(Value::as_str),
            TemplateValue::Scalar(_) => None,
        }
    }
}

impl From<Value> for TemplateValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => TemplateValue::List(items),
            other => TemplateValue::Scalar(other),
        }
    }
}

impl From<TemplateValue> for Value {
    fn from(value: TemplateValue) -> Self {
        match value {
            TemplateValue::Scalar(v) => v,
            TemplateValue::List(items) => Value::Array(items),
        }
    }
}

/// Default parameters for one named API action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallTemplate {
    entries: IndexMap<String, TemplateValue>,
}

impl CallTemplate {
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the call is declared to accept a `data` payload. A missing
    /// flag counts as read-only.
    pub fn accepts_data(&self) -> bool {
        match self.entries.get(DATA_KEY) {
            Some(TemplateValue::Scalar(v)) => is_truthy(v),
            Some(TemplateValue::List(items)) => !items.is_empty(),
            None => false,
        }
    }

    /// Declares `key` a list parameter for this template instance.
    pub fn mark_list(&mut self, key: &str) {
        self.entries
            .insert(key.to_string(), TemplateValue::List(Vec::new()));
    }

    /// Default `format` of the call, reported in response metadata.
    pub fn file_format(&self) -> Option<&Value> {
        self.scalar("format")
    }

    /// Default `returnFormat` of the call, reported in response metadata.
    pub fn error_format(&self) -> Option<&Value> {
        self.scalar("returnFormat")
    }

    fn scalar(&self, key: &str) -> Option<&Value> {
        match self.entries.get(key) {
            Some(TemplateValue::Scalar(v)) => Some(v),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for CallTemplate {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), TemplateValue::from(v.into())))
                .collect(),
        }
    }
}

/// Truthiness of a template default: `false`, `null`, zero, and empty
/// strings, sequences and mappings are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Mapping of call name to template, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definition {
    calls: IndexMap<String, CallTemplate>,
}

impl Definition {
    /// Builds a definition from an already-parsed document, unwrapping
    /// `api_def` when present.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        Self::from_value_at(value, Path::new("<memory>"))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ApiError> {
        let path = Path::new("<memory>");
        let value: Value = serde_json::from_str(text).map_err(|e| parse_error(path, e))?;
        Self::from_value_at(value, path)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ApiError> {
        let path = Path::new("<memory>");
        let value: Value = serde_yaml::from_str(text).map_err(|e| parse_error(path, e))?;
        Self::from_value_at(value, path)
    }

    /// Reads and parses a version file. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ApiError::DefinitionNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let value: Value = if is_json {
            serde_json::from_str(&text).map_err(|e| parse_error(path, e))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| parse_error(path, e))?
        };
        let definition = Self::from_value_at(value, path)?;
        tracing::debug!(path = %path.display(), calls = definition.len(), "loaded definition");
        Ok(definition)
    }

    fn from_value_at(value: Value, path: &Path) -> Result<Self, ApiError> {
        let value = match value {
            Value::Object(mut map) => {
                if map.get(WRAPPER_KEY).is_some_and(is_truthy) {
                    map.remove(WRAPPER_KEY).unwrap_or_default()
                } else {
                    Value::Object(map)
                }
            }
            other => other,
        };
        if !value.is_object() {
            return Err(ApiError::DefinitionParse {
                path: path.to_path_buf(),
                message: "expected a mapping of call name to template".to_string(),
            });
        }
        let calls: IndexMap<String, CallTemplate> =
            serde_json::from_value(value).map_err(|e| parse_error(path, e))?;
        Ok(Self { calls })
    }

    pub fn get(&self, name: &str) -> Option<&CallTemplate> {
        self.calls.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CallTemplate)> {
        self.calls.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CallTemplate)> for Definition {
    fn from_iter<I: IntoIterator<Item = (K, CallTemplate)>>(iter: I) -> Self {
        Self {
            calls: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> ApiError {
    ApiError::DefinitionParse {
        path: PathBuf::from(path),
        message: err.to_string(),
    }
}
