use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SchemaError;
use crate::param::{ParameterDescriptor, parse_properties};
use crate::schema::SchemaValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Get, Verb::Post, Verb::Put, Verb::Delete];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn as_lower(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb(pub String);

impl fmt::Display for UnknownVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown http method '{}'", self.0)
    }
}

impl std::error::Error for UnknownVerb {}

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    None,
    Scalar,
    Array,
    Object,
}

impl ReturnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Scalar => "scalar",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDescriptor {
    pub verb: Verb,
    pub name: String,
    pub comment: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub return_kind: ReturnKind,
    pub return_parameters: Vec<ParameterDescriptor>,
    pub return_link_key: String,
}

impl MethodDescriptor {
    pub fn from_schema(verb: Verb, schema: &SchemaValue<'_>) -> Result<Self, SchemaError> {
        let name = schema.field("name")?.as_str()?.to_string();

        let parameters = match schema.get_path(&["parameters", "properties"]) {
            Some(props) => parse_properties(&props)?,
            None => Vec::new(),
        };

        let (return_kind, return_parameters, return_link_key) = match schema.get("returns") {
            Some(returns) => parse_returns(&returns)?,
            None => (ReturnKind::None, Vec::new(), String::new()),
        };

        Ok(Self {
            verb,
            name,
            comment: schema.opt_str("description").map(str::to_string),
            parameters,
            return_kind,
            return_parameters,
            return_link_key,
        })
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| !p.optional)
    }

    pub fn optional_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.optional)
    }

    pub fn parameter(&self, wire_name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.wire_name == wire_name)
    }
}

fn parse_returns(
    returns: &SchemaValue<'_>,
) -> Result<(ReturnKind, Vec<ParameterDescriptor>, String), SchemaError> {
    let link_key = returns
        .get("links")
        .map(|links| links.items())
        .transpose()?
        .and_then(|links| links.into_iter().next())
        .and_then(|first| first.opt_str("href"))
        .map(|href| href.replace(['{', '}'], ""))
        .unwrap_or_default();

    if let Some(props) = returns.get("properties") {
        return Ok((ReturnKind::Object, parse_properties(&props)?, link_key));
    }
    if let Some(props) = returns.get_path(&["items", "properties"]) {
        return Ok((ReturnKind::Array, parse_properties(&props)?, link_key));
    }

    let kind = match returns.opt_str("type") {
        Some("null") => ReturnKind::None,
        Some("array") => ReturnKind::Array,
        Some("object") => ReturnKind::Object,
        _ => ReturnKind::Scalar,
    };
    Ok((kind, Vec::new(), link_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(verb: Verb, schema: Value) -> MethodDescriptor {
        MethodDescriptor::from_schema(verb, &SchemaValue::root(&schema)).unwrap()
    }

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!(Verb::parse("GET"), Some(Verb::Get));
        assert_eq!(Verb::parse("Post"), Some(Verb::Post));
        assert_eq!("delete".parse::<Verb>(), Ok(Verb::Delete));
        assert!("PATCH".parse::<Verb>().is_err());
    }

    #[test]
    fn object_return_parses_properties() {
        let method = parse(
            Verb::Get,
            json!({
                "name": "vm_status",
                "returns": {"type": "object", "properties": {
                    "status": {"type": "string"},
                    "uptime": {"type": "integer", "renderer": "duration", "optional": 1}
                }}
            }),
        );
        assert_eq!(method.return_kind, ReturnKind::Object);
        assert_eq!(method.return_parameters.len(), 2);
        assert_eq!(method.return_parameters[1].wire_name, "uptime");
    }

    #[test]
    fn array_return_with_link_key() {
        let method = parse(
            Verb::Get,
            json!({
                "name": "vmlist",
                "returns": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"vmid": {"type": "integer"}}},
                    "links": [{"rel": "child", "href": "{vmid}"}]
                }
            }),
        );
        assert_eq!(method.return_kind, ReturnKind::Array);
        assert_eq!(method.return_parameters[0].wire_name, "vmid");
        assert_eq!(method.return_link_key, "vmid");
    }

    #[test]
    fn null_plain_and_missing_returns() {
        let none = parse(Verb::Delete, json!({"name": "destroy", "returns": {"type": "null"}}));
        assert_eq!(none.return_kind, ReturnKind::None);

        let scalar = parse(Verb::Post, json!({"name": "create", "returns": {"type": "string"}}));
        assert_eq!(scalar.return_kind, ReturnKind::Scalar);

        let bare_array = parse(Verb::Get, json!({"name": "index", "returns": {"type": "array"}}));
        assert_eq!(bare_array.return_kind, ReturnKind::Array);
        assert!(bare_array.return_parameters.is_empty());

        let missing = parse(Verb::Get, json!({"name": "ping"}));
        assert_eq!(missing.return_kind, ReturnKind::None);
        assert_eq!(missing.return_link_key, "");
    }

    #[test]
    fn parameters_keep_schema_order() {
        let method = parse(
            Verb::Post,
            json!({
                "name": "create_vm",
                "description": "Create or restore a virtual machine.",
                "parameters": {"properties": {
                    "vmid": {"type": "integer"},
                    "node": {"type": "string"},
                    "archive": {"type": "string", "optional": 1}
                }}
            }),
        );
        let names: Vec<&str> = method.parameters.iter().map(|p| p.wire_name.as_str()).collect();
        assert_eq!(names, vec!["vmid", "node", "archive"]);
        assert_eq!(method.required_parameters().count(), 2);
        assert_eq!(method.comment.as_deref(), Some("Create or restore a virtual machine."));
    }

    #[test]
    fn missing_name_is_an_error() {
        let schema = json!({"returns": {"type": "null"}});
        let err = MethodDescriptor::from_schema(Verb::Get, &SchemaValue::root(&schema)).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }
}
