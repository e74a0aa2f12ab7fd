//! Runtime surface targeted by generated client code.

use std::collections::BTreeMap;

use serde_json::Value;

pub use crate::error::ClientError;
pub use crate::method::Verb;
use crate::param::FAMILY_MARKER;

/// Untyped response payload.
pub type ApiResult = Value;

pub trait Transport: Send + Sync {
    fn execute(&self, verb: Verb, path: &str, params: &Params) -> Result<ApiResult, ClientError>;
}

pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn execute(&self, verb: Verb, path: &str, params: Params) -> Result<ApiResult, ClientError> {
        tracing::debug!(%verb, path, params = params.len(), "api request");
        self.transport.execute(verb, path, &params)
    }
}

pub trait ParamValue {
    /// `None` leaves the field off the request.
    fn to_wire(&self) -> Option<String>;
}

impl ParamValue for bool {
    fn to_wire(&self) -> Option<String> {
        Some(if *self { "1" } else { "0" }.to_string())
    }
}

macro_rules! int_param {
    ($($ty:ty),*) => {
        $(impl ParamValue for $ty {
            fn to_wire(&self) -> Option<String> {
                Some(self.to_string())
            }
        })*
    };
}

int_param!(i32, i64, u32, u64, usize);

impl ParamValue for str {
    fn to_wire(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl ParamValue for String {
    fn to_wire(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl<T: ParamValue + ?Sized> ParamValue for &T {
    fn to_wire(&self) -> Option<String> {
        (**self).to_wire()
    }
}

impl<T: ParamValue> ParamValue for Option<T> {
    fn to_wire(&self) -> Option<String> {
        self.as_ref().and_then(ParamValue::to_wire)
    }
}

/// Request fields keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, wire_name: &str, value: impl ParamValue) {
        if let Some(value) = value.to_wire() {
            self.values.insert(wire_name.to_string(), value);
        }
    }

    /// Expands an `[n]` family into one field per index, `prefix0`, `prefix1`, ...
    pub fn set_indexed(&mut self, wire_name: &str, values: Option<&BTreeMap<u32, String>>) {
        let prefix = wire_name.strip_suffix(FAMILY_MARKER).unwrap_or(wire_name);
        for (index, value) in values.into_iter().flatten() {
            self.values.insert(format!("{prefix}{index}"), value.clone());
        }
    }

    /// Whether any `prefix<digits>` field of an `[n]` family is present.
    pub fn has_family(&self, wire_name: &str) -> bool {
        let prefix = wire_name.strip_suffix(FAMILY_MARKER).unwrap_or(wire_name);
        self.values.keys().any(|key| {
            key.strip_prefix(prefix)
                .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
        })
    }

    pub fn get(&self, wire_name: &str) -> Option<&str> {
        self.values.get(wire_name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn encode_segment(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}
