//! Typed records extracted from a release manifest (`release.MF` or a dev
//! release manifest).

use crate::document::Document;
use crate::normalize::normalize_release_manifest;
use crate::types::Sha1Hex;
use crate::SchemaError;
use serde::Serialize;
use serde_yaml::Value;
use std::fs;
use std::path::Path;

const CONTEXT: &str = "release manifest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseManifest {
    pub name: String,
    pub version: String,
    pub commit_hash: String,
    pub uncommitted_changes: bool,
    /// Declared checksum of `license.tgz`, when the manifest records one.
    pub license_sha1: Option<Sha1Hex>,
    pub packages: Vec<PackageRecord>,
    pub jobs: Vec<JobRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: Sha1Hex,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: Sha1Hex,
    pub properties: Vec<PropertyRecord>,
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRecord {
    pub name: String,
    pub description: String,
}

impl ReleaseManifest {
    /// Normalize, parse, and extract a release manifest from its text.
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        let normalized = normalize_release_manifest(input);
        let value: Value = serde_yaml::from_str(&normalized)?;
        Self::from_value(&value)
    }

    pub fn parse_file(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let doc = Document::new(CONTEXT, value)?;

        let license_sha1 = match doc.opt_map("license")? {
            Some(license) => license.opt_str("sha1")?.map(Sha1Hex::from),
            None => None,
        };

        let packages = doc
            .seq("packages")?
            .iter()
            .enumerate()
            .map(|(i, item)| PackageRecord::from_value(i, item))
            .collect::<Result<Vec<_>, _>>()?;

        let jobs = doc
            .seq("jobs")?
            .iter()
            .enumerate()
            .map(|(i, item)| JobRecord::from_value(i, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: doc.str("name")?.to_owned(),
            version: doc.str("version")?.to_owned(),
            commit_hash: doc.str("commit_hash")?.to_owned(),
            uncommitted_changes: doc.bool("uncommitted_changes")?,
            license_sha1,
            packages,
            jobs,
        })
    }
}

/// Fingerprint and version are the same value in practice; either key may be
/// the only one present.
fn version_and_fingerprint(doc: &Document<'_>) -> Result<(String, String), SchemaError> {
    let version = doc.opt_str("version")?;
    let fingerprint = doc.opt_str("fingerprint")?;
    match (version, fingerprint) {
        (Some(v), Some(f)) => Ok((v.to_owned(), f.to_owned())),
        (Some(v), None) => Ok((v.to_owned(), v.to_owned())),
        (None, Some(f)) => Ok((f.to_owned(), f.to_owned())),
        (None, None) => Err(SchemaError::MissingField {
            context: doc.context().to_owned(),
            field: "fingerprint".to_owned(),
        }),
    }
}

impl PackageRecord {
    fn from_value(index: usize, value: &Value) -> Result<Self, SchemaError> {
        let doc = Document::new(format!("{CONTEXT} package #{index}"), value)?;
        let name = doc.str("name")?;
        let doc = Document::new(format!("{CONTEXT} package '{name}'"), value)?;
        let (version, fingerprint) = version_and_fingerprint(&doc)?;

        Ok(Self {
            name: name.to_owned(),
            version,
            fingerprint,
            sha1: Sha1Hex::from(doc.str("sha1")?),
            dependencies: doc.string_list("dependencies")?,
        })
    }
}

impl JobRecord {
    fn from_value(index: usize, value: &Value) -> Result<Self, SchemaError> {
        let doc = Document::new(format!("{CONTEXT} job #{index}"), value)?;
        let name = doc.str("name")?;
        let doc = Document::new(format!("{CONTEXT} job '{name}'"), value)?;

        let properties = doc
            .opt_seq("properties")?
            .iter()
            .map(|item| -> Result<PropertyRecord, SchemaError> {
                let prop = Document::new(format!("{CONTEXT} job '{name}' property"), item)?;
                Ok(PropertyRecord {
                    name: prop.str("name")?.to_owned(),
                    description: prop.opt_str("description")?.unwrap_or_default().to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_owned(),
            version: doc.opt_str("version")?.unwrap_or_default().to_owned(),
            fingerprint: doc.opt_str("fingerprint")?.unwrap_or_default().to_owned(),
            sha1: Sha1Hex::from(doc.str("sha1")?),
            properties,
            packages: doc.string_list("packages")?,
        })
    }
}
