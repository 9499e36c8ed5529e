use crate::package::Package;
use crate::CoreError;
use roleforge_schema::{JobRecord, Sha1Hex};
use roleforge_store::{extract_archive, verify_sha1, ReleaseLayout};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A job template archive within a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub name: String,
    pub release_name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: Sha1Hex,
    pub path: PathBuf,
    pub properties: Vec<JobProperty>,
    /// Packages the job runs with, resolved against the owning release in
    /// manifest order.
    #[serde(skip)]
    pub packages: Vec<Arc<Package>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobProperty {
    pub name: String,
    pub description: String,
}

impl Job {
    pub fn validate_sha1(&self) -> Result<(), CoreError> {
        verify_sha1(&self.path, &self.sha1)?;
        Ok(())
    }

    /// Unpack the archive into a new subdirectory of `dest_dir` and return it.
    pub fn extract(&self, dest_dir: &Path) -> Result<PathBuf, CoreError> {
        let prefix = format!("job-{}-", self.name);
        Ok(extract_archive(&self.path, dest_dir, &prefix)?)
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|p| p.name.as_str())
    }
}

/// Build the jobs of a release, binding each job's package names to the
/// already-built package table.
pub(crate) fn build_jobs(
    release: &str,
    records: &[JobRecord],
    packages: &[Arc<Package>],
    layout: &ReleaseLayout,
) -> Result<Vec<Arc<Job>>, CoreError> {
    let mut by_name: HashMap<&str, &Arc<Package>> = HashMap::with_capacity(packages.len());
    for pkg in packages {
        by_name.entry(pkg.name.as_str()).or_insert(pkg);
    }

    records
        .iter()
        .map(|record| -> Result<Arc<Job>, CoreError> {
            let job_packages = record
                .packages
                .iter()
                .map(|name| {
                    by_name
                        .get(name.as_str())
                        .map(|&pkg| Arc::clone(pkg))
                        .ok_or_else(|| CoreError::UnknownJobPackage {
                            release: release.to_owned(),
                            job: record.name.clone(),
                            package: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Arc::new(Job {
                name: record.name.clone(),
                release_name: release.to_owned(),
                version: record.version.clone(),
                fingerprint: record.fingerprint.clone(),
                sha1: record.sha1.clone(),
                path: layout.job_archive(&record.sha1),
                properties: record
                    .properties
                    .iter()
                    .map(|p| JobProperty {
                        name: p.name.clone(),
                        description: p.description.clone(),
                    })
                    .collect(),
                packages: job_packages,
            }))
        })
        .collect()
}
