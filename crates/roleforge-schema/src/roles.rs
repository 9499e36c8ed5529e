//! Typed shape of the role manifest: the operator-authored document grouping
//! release jobs into roles.

use crate::SchemaError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const ROLE_TYPE_BOSH: &str = "bosh";
pub const ROLE_TYPE_BOSH_TASK: &str = "bosh-task";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RoleManifestFile {
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
    #[serde(default)]
    pub configuration: Option<Configuration>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RoleDefinition {
    pub name: String,
    /// Empty means [`ROLE_TYPE_BOSH`].
    #[serde(default, rename = "type")]
    pub role_type: String,
    #[serde(default)]
    pub jobs: Vec<RoleJobReference>,
    #[serde(default)]
    pub environment_scripts: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub post_config_scripts: Vec<String>,
    #[serde(default)]
    pub configuration: Option<Configuration>,
    #[serde(default)]
    pub run: Option<RoleRun>,
}

impl RoleDefinition {
    pub fn effective_type(&self) -> &str {
        if self.role_type.is_empty() {
            ROLE_TYPE_BOSH
        } else {
            &self.role_type
        }
    }

    pub fn is_supported_type(&self) -> bool {
        matches!(self.effective_type(), ROLE_TYPE_BOSH | ROLE_TYPE_BOSH_TASK)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoleJobReference {
    pub name: String,
    pub release_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Configuration {
    #[serde(default, deserialize_with = "scalar_map")]
    pub templates: BTreeMap<String, String>,
}

/// Runtime metadata consumed by artifact generators. Not interpreted here.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RoleRun {
    #[serde(default, rename = "exposed-ports")]
    pub exposed_ports: Vec<ExposedPort>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExposedPort {
    pub name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub external: Option<PortSpec>,
    #[serde(default)]
    pub internal: Option<PortSpec>,
    #[serde(default)]
    pub public: bool,
}

/// A single port number or a `min-max` range, as written.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortSpec {
    Number(u32),
    Text(String),
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Template values are strings, but operators write bare numbers and booleans
/// too; those keep their scalar text.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| -> Result<(String, String), D::Error> {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(serde::de::Error::custom(format!(
                        "template '{key}' must be a scalar"
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}

pub fn parse_role_manifest_str(input: &str) -> Result<RoleManifestFile, SchemaError> {
    Ok(serde_yaml::from_str(input)?)
}

pub fn parse_role_manifest_file(path: &Path) -> Result<RoleManifestFile, SchemaError> {
    let content = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_role_manifest_str(&content)
}
