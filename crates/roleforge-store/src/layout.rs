use crate::StoreError;
use roleforge_schema::{DevReleaseConfig, DevReleaseIndex, SchemaError};
use std::io;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "release.MF";
pub const PACKAGES_DIR: &str = "packages";
pub const JOBS_DIR: &str = "jobs";
pub const LICENSE_ARCHIVE: &str = "license.tgz";
const DEV_RELEASES_DIR: &str = "dev_releases";
const DEV_CONFIG: &str = "config/dev.yml";
const FINAL_CONFIG: &str = "config/final.yml";
const DEV_INDEX: &str = "index.yml";

/// Directory layout of a release on disk.
///
/// Final releases keep `release.MF` and the package/job archives under the
/// release root. Dev releases keep their manifests under
/// `dev_releases/<name>/` and their archives in a shared cache directory, one
/// file per SHA-1.
#[derive(Debug, Clone)]
pub struct ReleaseLayout {
    root: PathBuf,
    dev: Option<DevLayout>,
}

#[derive(Debug, Clone)]
struct DevLayout {
    name: String,
    version: String,
    cache_dir: PathBuf,
}

impl ReleaseLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dev: None,
        }
    }

    /// Layout of a dev release. An empty `name` is read from the release's
    /// `config/` files; an empty `version` resolves to the latest build in
    /// the dev release index.
    pub fn dev(
        root: impl Into<PathBuf>,
        name: &str,
        version: &str,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        validate_path(&root, true, "release directory")?;

        let name = if name.is_empty() {
            resolve_dev_name(&root)?
        } else {
            name.to_owned()
        };
        let version = if version.is_empty() {
            resolve_dev_version(&root, &name)?
        } else {
            version.to_owned()
        };

        Ok(Self {
            root,
            dev: Some(DevLayout {
                name,
                version,
                cache_dir: cache_dir.into(),
            }),
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn is_dev(&self) -> bool {
        self.dev.is_some()
    }

    pub fn dev_cache_dir(&self) -> Option<&Path> {
        self.dev.as_ref().map(|d| d.cache_dir.as_path())
    }

    pub fn dev_name(&self) -> Option<&str> {
        self.dev.as_ref().map(|d| d.name.as_str())
    }

    pub fn dev_version(&self) -> Option<&str> {
        self.dev.as_ref().map(|d| d.version.as_str())
    }

    pub fn manifest_file(&self) -> PathBuf {
        match &self.dev {
            Some(dev) => self
                .root
                .join(DEV_RELEASES_DIR)
                .join(&dev.name)
                .join(format!("{}-{}.yml", dev.name, dev.version)),
            None => self.root.join(MANIFEST_FILE),
        }
    }

    #[inline]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join(PACKAGES_DIR)
    }

    #[inline]
    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join(JOBS_DIR)
    }

    #[inline]
    pub fn license_archive(&self) -> PathBuf {
        self.root.join(LICENSE_ARCHIVE)
    }

    /// Archive location of the package with the given SHA-1.
    pub fn package_archive(&self, sha1: &str) -> PathBuf {
        match &self.dev {
            Some(dev) => dev.cache_dir.join(sha1),
            None => self.packages_dir().join(sha1),
        }
    }

    /// Archive location of the job with the given SHA-1.
    pub fn job_archive(&self, sha1: &str) -> PathBuf {
        match &self.dev {
            Some(dev) => dev.cache_dir.join(sha1),
            None => self.jobs_dir().join(sha1),
        }
    }

    /// Check the release structure. Each check is its own failure, in order:
    /// root directory, manifest file, packages directory, jobs directory.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_path(&self.root, true, "release directory")?;
        validate_path(&self.manifest_file(), false, "release manifest file")?;
        validate_path(&self.packages_dir(), true, "packages directory")?;
        validate_path(&self.jobs_dir(), true, "jobs directory")?;
        Ok(())
    }
}

/// Check that `path` exists and is a directory (`expect_dir`) or a file.
pub fn validate_path(path: &Path, expect_dir: bool, what: &'static str) -> Result<(), StoreError> {
    let meta = std::fs::metadata(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => StoreError::MissingPath {
            what,
            path: path.to_path_buf(),
        },
        _ => StoreError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    match (expect_dir, meta.is_dir()) {
        (true, false) => Err(StoreError::NotADirectory {
            what,
            path: path.to_path_buf(),
        }),
        (false, true) => Err(StoreError::NotAFile {
            what,
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

/// `~/.bosh/cache`, where the release tooling keeps dev release blobs.
pub fn default_dev_cache_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".bosh").join("cache"))
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(crate::io_at(path))
}

fn resolve_dev_name(root: &Path) -> Result<String, StoreError> {
    for file in [DEV_CONFIG, FINAL_CONFIG] {
        if let Some(content) = read_optional(&root.join(file))? {
            if let Some(name) = DevReleaseConfig::parse(&content)?.release_name() {
                return Ok(name.to_owned());
            }
        }
    }
    Err(SchemaError::NoDevReleaseName {
        path: root.to_path_buf(),
    }
    .into())
}

fn resolve_dev_version(root: &Path, name: &str) -> Result<String, StoreError> {
    let index_path = root.join(DEV_RELEASES_DIR).join(name).join(DEV_INDEX);
    let content = read_optional(&index_path)?.unwrap_or_default();
    DevReleaseIndex::parse(&content)?
        .latest_version()
        .map(str::to_owned)
        .ok_or_else(|| {
            SchemaError::NoDevReleaseVersion {
                name: name.to_owned(),
            }
            .into()
        })
}
