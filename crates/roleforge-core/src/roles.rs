use crate::job::Job;
use crate::release::Release;
use crate::CoreError;
use roleforge_schema::{
    parse_role_manifest_file, RoleDefinition, RoleJobReference, RoleManifestFile, RoleRun,
    ROLE_TYPE_BOSH, ROLE_TYPE_BOSH_TASK,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleType {
    Bosh,
    BoshTask,
}

impl RoleType {
    /// Parse a declared role type. An empty string is [`RoleType::Bosh`];
    /// anything unrecognised is `None`.
    pub fn from_declared(s: &str) -> Option<Self> {
        match s {
            "" | ROLE_TYPE_BOSH => Some(Self::Bosh),
            ROLE_TYPE_BOSH_TASK => Some(Self::BoshTask),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bosh => ROLE_TYPE_BOSH,
            Self::BoshTask => ROLE_TYPE_BOSH_TASK,
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role with its job references bound to loaded jobs.
///
/// `jobs[i]` is the job named by `job_references[i]`. `templates` is the
/// manifest-wide template set overlaid with the role's own entries.
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub role_type: RoleType,
    pub job_references: Vec<RoleJobReference>,
    pub environ_scripts: Vec<String>,
    pub scripts: Vec<String>,
    pub post_config_scripts: Vec<String>,
    pub templates: BTreeMap<String, String>,
    pub jobs: Vec<Arc<Job>>,
    pub run: Option<RoleRun>,
    base_dir: PathBuf,
}

impl Role {
    /// Every relative script path of the role mapped to its location on disk.
    /// Absolute paths name files inside the target container and are left out.
    pub fn script_paths(&self) -> BTreeMap<String, PathBuf> {
        self.all_scripts()
            .filter(|script| !Path::new(script).is_absolute())
            .map(|script| (script.to_owned(), clean_join(&self.base_dir, script)))
            .collect()
    }

    /// Whether the role declares any script at all, absolute ones included.
    pub fn has_scripts(&self) -> bool {
        self.all_scripts().next().is_some()
    }

    fn all_scripts(&self) -> impl Iterator<Item = &str> {
        self.environ_scripts
            .iter()
            .chain(&self.scripts)
            .chain(&self.post_config_scripts)
            .map(String::as_str)
    }
}

/// The operator's role manifest, resolved against a set of releases.
#[derive(Debug, Clone)]
pub struct RoleManifest {
    pub roles: Vec<Role>,
    /// Manifest-wide template defaults. Empty when the manifest has none.
    pub templates: BTreeMap<String, String>,
    pub manifest_path: PathBuf,
}

impl RoleManifest {
    /// Load the role manifest at `path` and bind its roles to jobs from
    /// `releases`. Release names must be unique within `releases`.
    pub fn load(path: impl Into<PathBuf>, releases: &[Release]) -> Result<Self, CoreError> {
        let manifest_path = path.into();
        let by_name = index_releases(releases)?;
        let file = parse_role_manifest_file(&manifest_path)?;
        let manifest = Self::resolve(file, manifest_path, &by_name)?;
        info!(
            "loaded role manifest {} ({} roles)",
            manifest.manifest_path.display(),
            manifest.roles.len()
        );
        Ok(manifest)
    }

    fn resolve(
        file: RoleManifestFile,
        manifest_path: PathBuf,
        releases: &HashMap<&str, &Release>,
    ) -> Result<Self, CoreError> {
        let mut definitions = file.roles;
        for i in (0..definitions.len()).rev() {
            if !definitions[i].is_supported_type() {
                let dropped = definitions.remove(i);
                warn!(
                    "skipping role {} of unsupported type '{}'",
                    dropped.name, dropped.role_type
                );
            }
        }

        let templates = file.configuration.unwrap_or_default().templates;
        let base_dir = manifest_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        let roles = definitions
            .into_iter()
            .map(|def| build_role(def, &templates, &base_dir, releases))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            roles,
            templates,
            manifest_path,
        })
    }

    /// Roles ordered by name.
    pub fn sorted_roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.iter().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    pub fn lookup_role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }
}

fn index_releases(releases: &[Release]) -> Result<HashMap<&str, &Release>, CoreError> {
    let mut by_name = HashMap::with_capacity(releases.len());
    for release in releases {
        if by_name.insert(release.name.as_str(), release).is_some() {
            return Err(CoreError::DuplicateRelease(release.name.clone()));
        }
    }
    Ok(by_name)
}

fn build_role(
    def: RoleDefinition,
    global_templates: &BTreeMap<String, String>,
    base_dir: &Path,
    releases: &HashMap<&str, &Release>,
) -> Result<Role, CoreError> {
    let role_type = RoleType::from_declared(&def.role_type).unwrap_or(RoleType::Bosh);

    let mut jobs = Vec::with_capacity(def.jobs.len());
    for reference in &def.jobs {
        let release = releases.get(reference.release_name.as_str()).ok_or_else(|| {
            CoreError::UnknownRelease {
                release: reference.release_name.clone(),
                job: reference.name.clone(),
                role: def.name.clone(),
            }
        })?;
        let job = release
            .lookup_job(&reference.name)
            .map_err(|_| CoreError::UnknownRoleJob {
                release: reference.release_name.clone(),
                job: reference.name.clone(),
                role: def.name.clone(),
            })?;
        jobs.push(Arc::clone(job));
    }

    let mut templates = global_templates.clone();
    if let Some(own) = def.configuration {
        templates.extend(own.templates);
    }

    debug!(
        "resolved role {} ({role_type}, {} jobs, {} templates)",
        def.name,
        jobs.len(),
        templates.len()
    );

    Ok(Role {
        name: def.name,
        role_type,
        job_references: def.jobs,
        environ_scripts: def.environment_scripts,
        scripts: def.scripts,
        post_config_scripts: def.post_config_scripts,
        templates,
        jobs,
        run: def.run,
        base_dir: base_dir.to_path_buf(),
    })
}

/// Join `rel` onto `base` and fold away `.` and `..` components lexically.
fn clean_join(base: &Path, rel: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.join(rel).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() || out.parent().is_some() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
