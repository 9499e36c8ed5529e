pub mod completions;
pub mod extract;
pub mod show_release;
pub mod verify;
pub mod versions;

use indicatif::{ProgressBar, ProgressStyle};
use roleforge_core::{CoreError, Release};
use roleforge_schema::{ProjectConfig, ReleaseSource, DEFAULT_CONFIG_FILE};
use roleforge_store::StoreError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_INTEGRITY_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn plain_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "ok" => Style::new().green().apply_to(status).to_string(),
        "FAIL" => Style::new().red().bold().apply_to(status).to_string(),
        "dev" => Style::new().yellow().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

/// Render a core error with the prefix `main` maps to an exit code.
pub fn core_err(e: CoreError) -> String {
    match e {
        CoreError::Store(inner @ StoreError::Sha1Mismatch { .. }) => {
            format!("integrity error: {inner}")
        }
        other => other.to_string(),
    }
}

/// Releases, role manifest, and salt for one invocation: the config file
/// overlaid with command-line flags.
#[derive(Debug, Default)]
pub struct Inputs {
    pub releases: Vec<ReleaseSource>,
    pub role_manifest: Option<PathBuf>,
    pub salt: String,
}

impl Inputs {
    pub fn resolve(
        config: Option<&Path>,
        releases: &[PathBuf],
        dev_releases: &[PathBuf],
        cache_dir: Option<&Path>,
        role_manifest: Option<&Path>,
        salt: Option<&str>,
    ) -> Result<Self, String> {
        let project = match config {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                load_config(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => ProjectConfig::default(),
        };

        let mut inputs = Self {
            releases: project.releases,
            role_manifest: project.role_manifest,
            salt: project.salt,
        };
        if !releases.is_empty() || !dev_releases.is_empty() {
            inputs.releases = releases
                .iter()
                .map(ReleaseSource::final_release)
                .chain(
                    dev_releases
                        .iter()
                        .map(|p| ReleaseSource::dev_release(p, None)),
                )
                .collect();
        }
        if let Some(dir) = cache_dir {
            for source in inputs.releases.iter_mut().filter(|s| s.dev) {
                source.cache_dir.get_or_insert_with(|| dir.to_path_buf());
            }
        }
        if let Some(path) = role_manifest {
            inputs.role_manifest = Some(path.to_path_buf());
        }
        if let Some(salt) = salt {
            inputs.salt = salt.to_owned();
        }

        if inputs.releases.is_empty() {
            return Err(
                "no releases given: pass --release/--dev-release or list them in a config file"
                    .to_owned(),
            );
        }
        Ok(inputs)
    }

    pub fn role_manifest(&self) -> Result<&Path, String> {
        self.role_manifest.as_deref().ok_or_else(|| {
            "no role manifest given: pass --role-manifest or set role_manifest in a config file"
                .to_owned()
        })
    }

    /// Load every release, in order, showing progress unless `quiet`.
    pub fn load_releases(&self, quiet: bool) -> Result<Vec<Release>, String> {
        let mut loaded = Vec::with_capacity(self.releases.len());
        for source in &self.releases {
            let pb = (!quiet).then(|| spinner(&format!("loading {}", source.path.display())));
            match load_release(source) {
                Ok(release) => {
                    if let Some(pb) = &pb {
                        spin_ok(pb, &format!("{} {}", release.name, release.version));
                    }
                    loaded.push(release);
                }
                Err(e) => {
                    if let Some(pb) = &pb {
                        spin_fail(pb, &source.path.display().to_string());
                    }
                    return Err(core_err(e));
                }
            }
        }
        Ok(loaded)
    }
}

fn load_config(path: &Path) -> Result<ProjectConfig, String> {
    ProjectConfig::load(path).map_err(|e| format!("config error: {e}"))
}

pub fn load_release(source: &ReleaseSource) -> Result<Release, CoreError> {
    if source.dev {
        Release::load_dev(
            &source.path,
            source.name.as_deref().unwrap_or_default(),
            source.version.as_deref().unwrap_or_default(),
            source.cache_dir.as_deref(),
        )
    } else {
        Release::load(&source.path)
    }
}
