//! Release loading and content-addressable role versioning.
//!
//! This crate ties the schema and store layers into the in-memory model:
//! [`Release`] (with its [`Package`] graph, [`Job`]s and license),
//! [`RoleManifest`] (roles bound to concrete jobs, with merged configuration
//! templates), and the signature engine that turns a resolved role or manifest
//! into a deterministic SHA-1 version used to decide whether images need to
//! be rebuilt.

pub mod job;
pub mod package;
pub mod release;
pub mod roles;
pub mod signature;

pub use job::{Job, JobProperty};
pub use package::Package;
pub use release::{Release, ReleaseConfig};
pub use roles::{Role, RoleManifest, RoleType};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Schema(#[from] roleforge_schema::SchemaError),
    #[error("release error: {0}")]
    Store(#[from] roleforge_store::StoreError),
    #[error("release {release} is internally inconsistent: package {package} depends on unknown package {dependency}")]
    UnknownPackageDependency {
        release: String,
        package: String,
        dependency: String,
    },
    #[error("release {release} is internally inconsistent: package {package} is part of a dependency cycle")]
    PackageDependencyCycle { release: String, package: String },
    #[error("release {release} is internally inconsistent: job {job} uses unknown package {package}")]
    UnknownJobPackage {
        release: String,
        job: String,
        package: String,
    },
    #[error("cannot find package {package} in release {release}")]
    PackageNotFound { release: String, package: String },
    #[error("cannot find job {job} in release {release}")]
    JobNotFound { release: String, job: String },
    #[error("release {0} has been loaded more than once")]
    DuplicateRelease(String),
    #[error("release {release} has not been loaded and is referenced by job {job} in role {role}")]
    UnknownRelease {
        release: String,
        job: String,
        role: String,
    },
    #[error("cannot find job {job} in release {release}, referenced by role {role}")]
    UnknownRoleJob {
        release: String,
        job: String,
        role: String,
    },
    #[error("failed to read script {}: {source}", path.display())]
    Script {
        path: PathBuf,
        source: std::io::Error,
    },
}
