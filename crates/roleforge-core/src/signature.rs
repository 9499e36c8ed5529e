//! Deterministic SHA-1 versions for packages, roles, and whole manifests.
//!
//! Unordered inputs (packages, templates, script files, roles) are sorted
//! before they are hashed. A role's job list is hashed in declaration order.

use crate::package::Package;
use crate::roles::{Role, RoleManifest};
use crate::CoreError;
use roleforge_schema::{DevVersion, Sha1Hex};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

fn finish(hasher: Sha1) -> DevVersion {
    DevVersion::new(hex::encode(hasher.finalize()))
}

impl Package {
    /// SHA-1 over this package's checksum followed by the checksums of
    /// everything it depends on, directly or not, in name order.
    pub fn signature(&self) -> DevVersion {
        let mut hasher = Sha1::new();
        hasher.update(self.sha1.as_bytes());
        for dep in self.transitive_dependencies() {
            hasher.update(b"\n");
            hasher.update(dep.sha1.as_bytes());
        }
        finish(hasher)
    }
}

impl Role {
    /// Packages used by the role's jobs, once each, ordered by name then
    /// SHA-1.
    pub fn packages(&self) -> Vec<Arc<Package>> {
        let mut unique: BTreeMap<(&str, &Sha1Hex), &Arc<Package>> = BTreeMap::new();
        for job in &self.jobs {
            for pkg in &job.packages {
                unique.entry((pkg.name.as_str(), &pkg.sha1)).or_insert(pkg);
            }
        }
        unique.into_values().map(Arc::clone).collect()
    }

    /// SHA-1 over every relative script of the role: for each resolved path
    /// in byte order, the path's raw bytes and then the file's bytes.
    pub fn script_signature(&self) -> Result<DevVersion, CoreError> {
        let sorted: BTreeMap<Vec<u8>, PathBuf> = self
            .script_paths()
            .into_values()
            .map(|p| (p.as_os_str().as_encoded_bytes().to_vec(), p))
            .collect();

        let mut hasher = Sha1::new();
        for (raw, path) in &sorted {
            hasher.update(raw);
            let mut file = File::open(path).map_err(|source| CoreError::Script {
                path: path.clone(),
                source,
            })?;
            io::copy(&mut file, &mut hasher).map_err(|source| CoreError::Script {
                path: path.clone(),
                source,
            })?;
        }
        Ok(finish(hasher))
    }

    /// SHA-1 over the merged templates rendered as `key: value`, sorted.
    pub fn template_signature(&self) -> DevVersion {
        let mut rendered: Vec<String> = self
            .templates
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        rendered.sort();

        let mut hasher = Sha1::new();
        for line in &rendered {
            hasher.update(line.as_bytes());
        }
        finish(hasher)
    }

    /// The role's content version: job checksums in declaration order, then
    /// its packages' checksums, then the script and template signatures, each
    /// preceded by a newline and hashed once.
    pub fn dev_version(&self) -> Result<DevVersion, CoreError> {
        let mut signature = String::new();
        for job in &self.jobs {
            signature.push('\n');
            signature.push_str(&job.sha1);
        }
        for pkg in self.packages() {
            signature.push('\n');
            signature.push_str(&pkg.sha1);
        }
        if self.has_scripts() {
            signature.push('\n');
            signature.push_str(&self.script_signature()?);
        }
        if !self.templates.is_empty() {
            signature.push('\n');
            signature.push_str(&self.template_signature());
        }

        let version = finish(Sha1::new_with_prefix(signature.as_bytes()));
        debug!("role {} dev version {version}", self.name);
        Ok(version)
    }
}

impl RoleManifest {
    /// Each role with its dev version, ordered by role name.
    pub fn role_dev_versions(&self) -> Result<Vec<(&Role, DevVersion)>, CoreError> {
        let mut versions = Vec::with_capacity(self.roles.len());
        for role in self.sorted_roles() {
            versions.push((role, role.dev_version()?));
        }
        Ok(versions)
    }

    /// Version of the manifest as a whole: `extra` followed by every role's
    /// dev version in role-name order.
    pub fn dev_package_version(&self, extra: &str) -> Result<DevVersion, CoreError> {
        let mut hasher = Sha1::new();
        hasher.update(extra.as_bytes());
        for (_, version) in self.role_dev_versions()? {
            hasher.update(version.as_bytes());
        }
        Ok(finish(hasher))
    }
}
