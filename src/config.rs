use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::Reserved;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenConfig {
    /// Prepended to every generated type name.
    pub prefix: String,
    /// Appended to the prefix to name the root container type.
    pub root_suffix: String,
    /// Module path generated code imports the runtime from.
    pub runtime_path: String,
    pub extra_reserved: Vec<String>,
    pub header: Option<String>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            prefix: "Pve".to_string(),
            root_suffix: "Api".to_string(),
            runtime_path: "pve_apigen::client".to_string(),
            extra_reserved: Vec::new(),
            header: None,
        }
    }
}

impl GenConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn root_name(&self) -> String {
        format!("{}{}", self.prefix, self.root_suffix)
    }

    pub fn reserved(&self) -> Reserved {
        Reserved::with_extra(self.extra_reserved.iter().cloned())
    }
}
