//! Manifest parsing, normalization, and typed extraction for roleforge.
//!
//! This crate defines the schema layer: repair of the `!binary` tag defect in
//! release manifests (`normalize_release_manifest`), the schema-free release
//! document and its typed records (`ReleaseManifest`), the typed role manifest
//! file (`RoleManifestFile`), dev-release metadata, and the project config file.

pub mod config;
pub mod dev;
pub mod document;
pub mod normalize;
pub mod release;
pub mod roles;
pub mod types;

pub use config::{ProjectConfig, ReleaseSource, DEFAULT_CONFIG_FILE};
pub use dev::{compare_release_versions, DevReleaseConfig, DevReleaseIndex};
pub use document::Document;
pub use normalize::{fix_binary_tags, inline_binary_scalars, normalize_release_manifest};
pub use release::{JobRecord, PackageRecord, PropertyRecord, ReleaseManifest};
pub use roles::{
    parse_role_manifest_file, parse_role_manifest_str, Configuration, ExposedPort,
    PortSpec, RoleDefinition, RoleJobReference, RoleManifestFile, RoleRun, ROLE_TYPE_BOSH,
    ROLE_TYPE_BOSH_TASK,
};
pub use types::{DevVersion, Sha1Hex};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{context}: document root is not a mapping")]
    NotAMapping { context: String },
    #[error("{context}: required field '{field}' is missing")]
    MissingField { context: String, field: String },
    #[error("{context}: field '{field}' has the wrong type, expected {expected}")]
    FieldType {
        context: String,
        field: String,
        expected: &'static str,
    },
    #[error("cannot determine dev release name for {}", path.display())]
    NoDevReleaseName { path: PathBuf },
    #[error("dev release '{name}' has no builds in its index")]
    NoDevReleaseVersion { name: String },
}
