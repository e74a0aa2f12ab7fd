//! Typed access to the raw API descriptor.

use serde_json::{Map, Value};

use crate::error::SchemaError;

const SCHEMA_MARKER: &str = "apiSchema";

/// Parses either a bare JSON document or the `apidoc.js` script shipped with
/// the API viewer (`const apiSchema = [...]; ...`).
pub fn parse_payload(text: &str) -> Result<Value, SchemaError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let start = trimmed
        .find(SCHEMA_MARKER)
        .and_then(|pos| trimmed[pos..].find('[').map(|offset| pos + offset))
        .ok_or_else(|| SchemaError::UnexpectedShape {
            path: "$".to_string(),
            expected: "JSON array or apidoc.js script",
        })?;

    // only the first value matters, the script continues after the literal
    let mut stream = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<Value>();
    match stream.next() {
        Some(value) => Ok(value?),
        None => Err(SchemaError::UnexpectedShape {
            path: "$".to_string(),
            expected: "JSON array",
        }),
    }
}

#[derive(Debug, Clone)]
pub struct SchemaValue<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> SchemaValue<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: "$".to_string(),
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn child(&self, value: &'a Value, key: &str) -> Self {
        Self {
            value,
            path: format!("{}.{}", self.path, key),
        }
    }

    fn shape(&self, expected: &'static str) -> SchemaError {
        SchemaError::UnexpectedShape {
            path: self.path.clone(),
            expected,
        }
    }

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn as_object(&self) -> Result<&'a Map<String, Value>, SchemaError> {
        self.value.as_object().ok_or_else(|| self.shape("object"))
    }

    pub fn as_array(&self) -> Result<&'a [Value], SchemaError> {
        self.value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.shape("array"))
    }

    pub fn as_str(&self) -> Result<&'a str, SchemaError> {
        self.value.as_str().ok_or_else(|| self.shape("string"))
    }

    pub fn as_bool(&self) -> Result<bool, SchemaError> {
        self.value.as_bool().ok_or_else(|| self.shape("boolean"))
    }

    pub fn as_f64(&self) -> Result<f64, SchemaError> {
        match self.value {
            Value::Number(n) => n.as_f64().ok_or_else(|| self.shape("number")),
            Value::String(s) => s.trim().parse().map_err(|_| self.shape("number")),
            _ => Err(self.shape("number")),
        }
    }

    /// Required member of an object.
    pub fn field(&self, name: &str) -> Result<SchemaValue<'a>, SchemaError> {
        let map = self.as_object()?;
        match map.get(name) {
            Some(Value::Null) | None => Err(SchemaError::MissingField {
                path: self.path.clone(),
                field: name.to_string(),
            }),
            Some(value) => Ok(self.child(value, name)),
        }
    }

    /// Optional member; absent, `null` and non-object parents all yield `None`.
    pub fn get(&self, name: &str) -> Option<SchemaValue<'a>> {
        match self.value.get(name) {
            Some(Value::Null) | None => None,
            Some(value) => Some(self.child(value, name)),
        }
    }

    /// Walks a chain of optional members.
    pub fn get_path(&self, names: &[&str]) -> Option<SchemaValue<'a>> {
        let mut current = self.clone();
        for name in names {
            current = current.get(name)?;
        }
        Some(current)
    }

    /// Object members in document order.
    pub fn entries(&self) -> Result<Vec<(&'a str, SchemaValue<'a>)>, SchemaError> {
        let map = self.as_object()?;
        Ok(map
            .iter()
            .map(|(key, value)| (key.as_str(), self.child(value, key)))
            .collect())
    }

    pub fn items(&self) -> Result<Vec<SchemaValue<'a>>, SchemaError> {
        let items = self.as_array()?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(idx, value)| Self {
                value,
                path: format!("{}[{}]", self.path, idx),
            })
            .collect())
    }

    /// Scalars rendered as text. The descriptor is loose about `1` vs `"1"`
    /// and numeric bounds, so consumers compare stringwise.
    pub fn scalar_text(&self) -> Option<String> {
        match self.value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            _ => None,
        }
    }

    pub fn opt_str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(|v| v.value.as_str())
    }
}
