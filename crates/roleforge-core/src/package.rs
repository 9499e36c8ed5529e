use crate::CoreError;
use roleforge_schema::{PackageRecord, Sha1Hex};
use roleforge_store::{extract_archive, verify_sha1, ReleaseLayout};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A compiled package archive within a release.
///
/// `dependencies` holds the packages named by `dependency_names`, resolved
/// against the same release and in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: Sha1Hex,
    pub path: PathBuf,
    pub release_name: String,
    pub dependency_names: Vec<String>,
    #[serde(skip)]
    pub dependencies: Vec<Arc<Package>>,
}

impl Package {
    /// Stream the archive at `path` through SHA-1 and compare it with `sha1`.
    pub fn validate_sha1(&self) -> Result<(), CoreError> {
        verify_sha1(&self.path, &self.sha1)?;
        Ok(())
    }

    /// Unpack the archive into a new subdirectory of `dest_dir` and return it.
    pub fn extract(&self, dest_dir: &Path) -> Result<PathBuf, CoreError> {
        let prefix = format!("package-{}-", self.name);
        Ok(extract_archive(&self.path, dest_dir, &prefix)?)
    }

    /// Every package reachable through `dependencies`, without `self`,
    /// deduplicated and ordered by name then SHA-1.
    pub fn transitive_dependencies(&self) -> Vec<Arc<Package>> {
        let mut seen: BTreeMap<(String, Sha1Hex), Arc<Package>> = BTreeMap::new();
        let mut stack: Vec<&Arc<Package>> = self.dependencies.iter().collect();
        while let Some(pkg) = stack.pop() {
            let key = (pkg.name.clone(), pkg.sha1.clone());
            if seen.contains_key(&key) {
                continue;
            }
            seen.insert(key, Arc::clone(pkg));
            stack.extend(pkg.dependencies.iter());
        }
        seen.into_values().collect()
    }
}

/// Build the package table of a release from its manifest records.
///
/// Every declared dependency name must match a sibling package exactly; the
/// first package with a given name wins. Packages are built dependencies
/// first so each one holds live references to what it depends on, and the
/// returned list keeps manifest order.
pub(crate) fn build_package_graph(
    release: &str,
    records: &[PackageRecord],
    layout: &ReleaseLayout,
) -> Result<Vec<Arc<Package>>, CoreError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        index.entry(record.name.as_str()).or_insert(i);
    }

    for record in records {
        for dep in &record.dependencies {
            if !index.contains_key(dep.as_str()) {
                return Err(CoreError::UnknownPackageDependency {
                    release: release.to_owned(),
                    package: record.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let mut builder = GraphBuilder {
        release,
        records,
        index,
        layout,
        built: vec![None; records.len()],
        visiting: vec![false; records.len()],
    };
    for i in 0..records.len() {
        builder.build(i)?;
    }
    Ok(builder.built.into_iter().flatten().collect())
}

struct GraphBuilder<'a> {
    release: &'a str,
    records: &'a [PackageRecord],
    index: HashMap<&'a str, usize>,
    layout: &'a ReleaseLayout,
    built: Vec<Option<Arc<Package>>>,
    visiting: Vec<bool>,
}

impl GraphBuilder<'_> {
    fn build(&mut self, i: usize) -> Result<Arc<Package>, CoreError> {
        if let Some(pkg) = &self.built[i] {
            return Ok(Arc::clone(pkg));
        }
        let records = self.records;
        let record = &records[i];
        if self.visiting[i] {
            return Err(CoreError::PackageDependencyCycle {
                release: self.release.to_owned(),
                package: record.name.clone(),
            });
        }
        self.visiting[i] = true;

        let mut dependencies = Vec::with_capacity(record.dependencies.len());
        for dep in &record.dependencies {
            let j = self.index[dep.as_str()];
            dependencies.push(self.build(j)?);
        }

        let pkg = Arc::new(Package {
            name: record.name.clone(),
            version: record.version.clone(),
            fingerprint: record.fingerprint.clone(),
            sha1: record.sha1.clone(),
            path: self.layout.package_archive(&record.sha1),
            release_name: self.release.to_owned(),
            dependency_names: record.dependencies.clone(),
            dependencies,
        });
        debug!(
            "resolved package {} ({} dependencies) at {}",
            pkg.name,
            pkg.dependencies.len(),
            pkg.path.display()
        );
        self.built[i] = Some(Arc::clone(&pkg));
        Ok(pkg)
    }
}
