use crate::job::{build_jobs, Job};
use crate::package::{build_package_graph, Package};
use crate::CoreError;
use roleforge_schema::ReleaseManifest;
use roleforge_store::{
    default_dev_cache_dir, verify_sha1, IntegrityReport, License, ReleaseLayout, StoreError,
};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A loaded release: header fields from its manifest, its package graph, its
/// jobs, and its license files.
///
/// A `Release` is only ever returned fully built. Packages and jobs are
/// shared with the roles that reference them.
#[derive(Debug, Clone)]
pub struct Release {
    pub name: String,
    pub version: String,
    pub commit_hash: String,
    pub uncommitted_changes: bool,
    pub path: PathBuf,
    pub dev: bool,
    pub dev_cache_dir: Option<PathBuf>,
    pub packages: Vec<Arc<Package>>,
    pub jobs: Vec<Arc<Job>>,
    pub license: License,
    layout: ReleaseLayout,
}

/// One job property name as seen across all jobs of a release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseConfig {
    pub name: String,
    /// Description from the first job declaring the property.
    pub description: String,
    #[serde(serialize_with = "job_names")]
    pub jobs: Vec<Arc<Job>>,
    pub usage_count: usize,
}

fn job_names<S: Serializer>(jobs: &[Arc<Job>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(jobs.iter().map(|j| j.name.as_str()))
}

impl Release {
    /// Load a final release rooted at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        Self::from_layout(ReleaseLayout::new(path))
    }

    /// Load a dev release. Empty `name` and `version` are discovered from the
    /// release directory; a missing `cache_dir` means `~/.bosh/cache`.
    pub fn load_dev(
        path: impl Into<PathBuf>,
        name: &str,
        version: &str,
        cache_dir: Option<&Path>,
    ) -> Result<Self, CoreError> {
        let cache_dir = match cache_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => default_dev_cache_dir().ok_or_else(|| StoreError::MissingPath {
                what: "dev release cache directory",
                path: PathBuf::from("~/.bosh/cache"),
            })?,
        };
        let layout = ReleaseLayout::dev(path, name, version, cache_dir)?;
        Self::from_layout(layout)
    }

    fn from_layout(layout: ReleaseLayout) -> Result<Self, CoreError> {
        layout.validate()?;

        let manifest_path = layout.manifest_file();
        let manifest = ReleaseManifest::parse_file(&manifest_path)?;
        debug!(
            "parsed release manifest {} ({} packages, {} jobs)",
            manifest_path.display(),
            manifest.packages.len(),
            manifest.jobs.len()
        );

        let license = License::load(&layout.license_archive(), manifest.license_sha1.clone())?;
        let packages = build_package_graph(&manifest.name, &manifest.packages, &layout)?;
        let jobs = build_jobs(&manifest.name, &manifest.jobs, &packages, &layout)?;

        info!(
            "loaded release {} {} from {} ({} packages, {} jobs{})",
            manifest.name,
            manifest.version,
            layout.root().display(),
            packages.len(),
            jobs.len(),
            if layout.is_dev() { ", dev" } else { "" }
        );

        Ok(Self {
            name: manifest.name,
            version: manifest.version,
            commit_hash: manifest.commit_hash,
            uncommitted_changes: manifest.uncommitted_changes,
            path: layout.root().to_path_buf(),
            dev: layout.is_dev(),
            dev_cache_dir: layout.dev_cache_dir().map(Path::to_path_buf),
            packages,
            jobs,
            license,
            layout,
        })
    }

    /// Path of the manifest this release was loaded from.
    pub fn manifest_path(&self) -> PathBuf {
        self.layout.manifest_file()
    }

    pub fn license_path(&self) -> PathBuf {
        self.layout.license_archive()
    }

    /// First package named `name`.
    pub fn lookup_package(&self, name: &str) -> Result<&Arc<Package>, CoreError> {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CoreError::PackageNotFound {
                release: self.name.clone(),
                package: name.to_owned(),
            })
    }

    /// First job named `name`.
    pub fn lookup_job(&self, name: &str) -> Result<&Arc<Job>, CoreError> {
        self.jobs
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| CoreError::JobNotFound {
                release: self.name.clone(),
                job: name.to_owned(),
            })
    }

    /// Every job property name in the release, with the jobs declaring it.
    pub fn unique_configs(&self) -> BTreeMap<String, ReleaseConfig> {
        let mut result: BTreeMap<String, ReleaseConfig> = BTreeMap::new();
        for job in &self.jobs {
            for property in &job.properties {
                if let Some(config) = result.get_mut(&property.name) {
                    config.usage_count += 1;
                    config.jobs.push(Arc::clone(job));
                } else {
                    result.insert(
                        property.name.clone(),
                        ReleaseConfig {
                            name: property.name.clone(),
                            description: property.description.clone(),
                            jobs: vec![Arc::clone(job)],
                            usage_count: 1,
                        },
                    );
                }
            }
        }
        result
    }

    /// Check every package and job archive against its recorded SHA-1, and
    /// the license archive against its declared one. Failures are collected,
    /// not raised.
    pub fn verify(&self) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        for pkg in &self.packages {
            report.record(
                format!("package {}", pkg.name),
                verify_sha1(&pkg.path, &pkg.sha1),
            );
        }
        for job in &self.jobs {
            report.record(format!("job {}", job.name), verify_sha1(&job.path, &job.sha1));
        }

        let license_path = self.license_path();
        let license_outcome = self.license.verify(&license_path);
        if license_outcome.is_err() {
            warn!(
                "license archive {} does not match its declared sha1",
                license_path.display()
            );
        }
        report.record("license", license_outcome);

        debug!(
            "verified release {}: {}/{} passed",
            self.name, report.passed, report.checked
        );
        report
    }
}
