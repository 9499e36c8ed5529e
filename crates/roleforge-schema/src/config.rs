use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "roleforge.json";

/// Project configuration: which releases to load and which role manifest to
/// resolve against them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub releases: Vec<ReleaseSource>,
    #[serde(default)]
    pub role_manifest: Option<PathBuf>,
    /// Extra input mixed into the manifest-level version.
    #[serde(default)]
    pub salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseSource {
    pub path: PathBuf,
    #[serde(default)]
    pub dev: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl ReleaseSource {
    pub fn final_release(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dev: false,
            name: None,
            version: None,
            cache_dir: None,
        }
    }

    pub fn dev_release(path: impl Into<PathBuf>, cache_dir: Option<PathBuf>) -> Self {
        Self {
            dev: true,
            cache_dir,
            ..Self::final_release(path)
        }
    }
}

impl ProjectConfig {
    /// Load a config file. Relative paths inside it are taken relative to the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.anchor_paths(base);
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), SchemaError> {
        let write_err = |source| SchemaError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)?;
        Ok(())
    }

    fn anchor_paths(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for release in &mut self.releases {
            anchor(&mut release.path);
            if let Some(cache) = release.cache_dir.as_mut() {
                anchor(cache);
            }
        }
        if let Some(manifest) = self.role_manifest.as_mut() {
            anchor(manifest);
        }
    }
}
