use serde::Serialize;

use crate::error::SchemaError;
use crate::render::Renderer;
use crate::schema::SchemaValue;

pub const FAMILY_MARKER: &str = "[n]";
const FORMAT_REFERENCE_PREFIX: &str = "pve-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    String,
}

impl ParamType {
    pub fn from_schema(raw: Option<&str>) -> Self {
        match raw {
            Some("boolean") => Self::Bool,
            Some("integer") | Some("number") => Self::Int,
            Some("string") | None => Self::String,
            Some(other) => {
                tracing::trace!(schema_type = other, "unknown parameter type, using string");
                Self::String
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::String => "string",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterDescriptor {
    pub wire_name: String,
    pub is_indexed_family: bool,
    pub param_type: ParamType,
    pub type_text: Option<String>,
    pub optional: bool,
    pub description: Option<String>,
    pub enum_values: Vec<String>,
    pub format_name: Option<String>,
    pub nested_formats: Vec<ParameterDescriptor>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub default: Option<String>,
    pub renderer: Renderer,
}

impl ParameterDescriptor {
    pub fn from_property(wire_name: &str, schema: &SchemaValue<'_>) -> Result<Self, SchemaError> {
        let param_type = ParamType::from_schema(schema.opt_str("type"));

        let optional = schema
            .get("optional")
            .and_then(|v| v.scalar_text())
            .is_some_and(|v| v == "1");

        let enum_values = match schema.get("enum") {
            Some(values) => values
                .items()?
                .iter()
                .filter_map(SchemaValue::scalar_text)
                .collect(),
            None => Vec::new(),
        };

        let (format_name, nested_formats) = match schema.get("format") {
            Some(format) => parse_format(&format)?,
            None => (None, Vec::new()),
        };

        let minimum = schema.get("minimum").map(|v| v.as_f64()).transpose()?;
        let maximum = schema.get("maximum").map(|v| v.as_f64()).transpose()?;

        Ok(Self {
            wire_name: wire_name.to_string(),
            is_indexed_family: wire_name.ends_with(FAMILY_MARKER),
            param_type,
            type_text: schema.opt_str("typetext").map(str::to_string),
            optional,
            description: schema.opt_str("description").map(str::to_string),
            enum_values,
            format_name,
            nested_formats,
            minimum,
            maximum,
            default: schema.get("default").and_then(|v| v.scalar_text()),
            renderer: Renderer::parse(schema.opt_str("renderer")),
        })
    }

    /// Wire name without the `[n]` marker; families are sent as
    /// `prefix0`, `prefix1`, ...
    pub fn family_prefix(&self) -> &str {
        self.wire_name
            .strip_suffix(FAMILY_MARKER)
            .unwrap_or(&self.wire_name)
    }

    pub fn display_type(&self) -> &str {
        match &self.type_text {
            Some(text) => text,
            None => self.param_type.as_str(),
        }
    }
}

pub fn parse_properties(schema: &SchemaValue<'_>) -> Result<Vec<ParameterDescriptor>, SchemaError> {
    schema
        .entries()?
        .iter()
        .map(|(name, prop)| ParameterDescriptor::from_property(name, prop))
        .collect()
}

// A string format names a registered format, `pve-` ones reference another
// descriptor; only an inline object describes a nested structure.
fn parse_format(
    format: &SchemaValue<'_>,
) -> Result<(Option<String>, Vec<ParameterDescriptor>), SchemaError> {
    if let Ok(name) = format.as_str() {
        return Ok((Some(name.to_string()), Vec::new()));
    }
    if !format.is_object() {
        return Ok((None, Vec::new()));
    }

    let entries = format.entries()?;
    if entries.is_empty() {
        return Ok((None, Vec::new()));
    }
    if let Some(name) = format.opt_str("type")
        && name.starts_with(FORMAT_REFERENCE_PREFIX)
    {
        return Ok((Some(name.to_string()), Vec::new()));
    }

    let mut nested = Vec::with_capacity(entries.len());
    for (key, value) in &entries {
        if !value.is_object() {
            continue;
        }
        nested.push(ParameterDescriptor::from_property(key, value)?);
    }
    Ok((None, nested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(name: &str, schema: Value) -> ParameterDescriptor {
        ParameterDescriptor::from_property(name, &SchemaValue::root(&schema)).unwrap()
    }

    #[test]
    fn maps_types_through_fixed_table() {
        assert_eq!(parse("a", json!({"type": "boolean"})).param_type, ParamType::Bool);
        assert_eq!(parse("a", json!({"type": "integer"})).param_type, ParamType::Int);
        assert_eq!(parse("a", json!({"type": "number"})).param_type, ParamType::Int);
        assert_eq!(parse("a", json!({"type": "string"})).param_type, ParamType::String);
        assert_eq!(parse("a", json!({})).param_type, ParamType::String);
        assert_eq!(parse("a", json!({"type": "ipv4"})).param_type, ParamType::String);
    }

    #[test]
    fn detects_indexed_family() {
        let param = parse("ipconfig[n]", json!({"type": "string", "optional": 1}));
        assert!(param.is_indexed_family);
        assert_eq!(param.family_prefix(), "ipconfig");
        assert!(param.optional);

        let plain = parse("ipconfig", json!({"type": "string"}));
        assert!(!plain.is_indexed_family);
        assert_eq!(plain.family_prefix(), "ipconfig");
    }

    #[test]
    fn optional_is_compared_stringwise() {
        assert!(parse("a", json!({"optional": "1"})).optional);
        assert!(parse("a", json!({"optional": 1})).optional);
        assert!(!parse("a", json!({"optional": 0})).optional);
        assert!(!parse("a", json!({})).optional);
    }

    #[test]
    fn keeps_enum_order_and_bounds() {
        let param = parse(
            "cpu",
            json!({"type": "integer", "enum": ["z", "a", "m"], "minimum": 1, "maximum": "128"}),
        );
        assert_eq!(param.enum_values, vec!["z", "a", "m"]);
        assert_eq!(param.minimum, Some(1.0));
        assert_eq!(param.maximum, Some(128.0));
    }

    #[test]
    fn inline_format_yields_nested_descriptors() {
        let param = parse(
            "net[n]",
            json!({
                "type": "string",
                "format": {
                    "model": {"type": "string", "enum": ["e1000", "virtio"]},
                    "bridge": {"type": "string", "optional": 1},
                    "tag": {"type": "integer", "optional": 1}
                }
            }),
        );
        let names: Vec<&str> = param.nested_formats.iter().map(|p| p.wire_name.as_str()).collect();
        assert_eq!(names, vec!["model", "bridge", "tag"]);
        assert_eq!(param.nested_formats[2].param_type, ParamType::Int);
        // nested shape is metadata only
        assert_eq!(param.param_type, ParamType::String);
        assert!(param.is_indexed_family);
    }

    #[test]
    fn named_formats_have_no_nested_shape() {
        let param = parse("vmid", json!({"type": "integer", "format": "pve-vmid"}));
        assert!(param.nested_formats.is_empty());
        assert_eq!(param.format_name.as_deref(), Some("pve-vmid"));

        let referenced = parse(
            "acme",
            json!({"format": {"type": "pve-acme-domain", "description": "x"}}),
        );
        assert!(referenced.nested_formats.is_empty());
        assert_eq!(referenced.format_name.as_deref(), Some("pve-acme-domain"));
    }

    #[test]
    fn renderer_and_type_text_pass_through() {
        let param = parse(
            "maxmem",
            json!({"type": "integer", "renderer": "bytes", "typetext": "<size>"}),
        );
        assert_eq!(param.renderer, Renderer::Bytes);
        assert_eq!(param.display_type(), "<size>");

        let odd = parse("x", json!({"renderer": "sparkline"}));
        assert_eq!(odd.renderer, Renderer::Other("sparkline".into()));
        assert_eq!(odd.display_type(), "string");
    }
}
