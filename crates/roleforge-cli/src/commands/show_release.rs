use super::{colorize_status, core_err, json_pretty, load_release, EXIT_SUCCESS};
use roleforge_core::Release;
use roleforge_schema::ReleaseSource;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct PackageView<'a> {
    name: &'a str,
    fingerprint: &'a str,
    sha1: &'a str,
    dependencies: &'a [String],
    signature: String,
}

#[derive(Serialize)]
struct JobView<'a> {
    name: &'a str,
    sha1: &'a str,
    packages: Vec<&'a str>,
    properties: usize,
}

#[derive(Serialize)]
struct ReleaseView<'a> {
    name: &'a str,
    version: &'a str,
    commit_hash: &'a str,
    uncommitted_changes: bool,
    dev: bool,
    path: &'a Path,
    manifest: PathBuf,
    packages: Vec<PackageView<'a>>,
    jobs: Vec<JobView<'a>>,
    license_files: Vec<&'a str>,
    license_sha1: &'a str,
}

pub fn run(
    path: &Path,
    dev: bool,
    cache_dir: Option<&Path>,
    configs: bool,
    json: bool,
) -> Result<u8, String> {
    let source = if dev {
        ReleaseSource::dev_release(path, cache_dir.map(Path::to_path_buf))
    } else {
        ReleaseSource::final_release(path)
    };
    let release = load_release(&source).map_err(core_err)?;

    if configs {
        print_configs(&release, json)
    } else {
        print_release(&release, json)
    }
}

fn print_release(release: &Release, json: bool) -> Result<u8, String> {
    if json {
        let view = ReleaseView {
            name: &release.name,
            version: &release.version,
            commit_hash: &release.commit_hash,
            uncommitted_changes: release.uncommitted_changes,
            dev: release.dev,
            path: &release.path,
            manifest: release.manifest_path(),
            packages: release
                .packages
                .iter()
                .map(|p| PackageView {
                    name: &p.name,
                    fingerprint: &p.fingerprint,
                    sha1: &p.sha1,
                    dependencies: &p.dependency_names,
                    signature: p.signature().into_inner(),
                })
                .collect(),
            jobs: release
                .jobs
                .iter()
                .map(|j| JobView {
                    name: &j.name,
                    sha1: &j.sha1,
                    packages: j.package_names().collect(),
                    properties: j.properties.len(),
                })
                .collect(),
            license_files: release.license.files.keys().map(String::as_str).collect(),
            license_sha1: &release.license.actual_sha1,
        };
        println!("{}", json_pretty(&view)?);
        return Ok(EXIT_SUCCESS);
    }

    let kind = if release.dev { colorize_status("dev") } else { "final".to_owned() };
    println!("name:        {}", release.name);
    println!("version:     {} ({kind})", release.version);
    println!(
        "commit:      {}{}",
        release.commit_hash,
        if release.uncommitted_changes { "+" } else { "" }
    );
    println!("path:        {}", release.path.display());
    println!("manifest:    {}", release.manifest_path().display());
    println!("packages:    {}", release.packages.len());
    for pkg in &release.packages {
        if pkg.dependency_names.is_empty() {
            println!("  {} {}", pkg.name, pkg.sha1);
        } else {
            println!(
                "  {} {} -> {}",
                pkg.name,
                pkg.sha1,
                pkg.dependency_names.join(", ")
            );
        }
    }
    println!("jobs:        {}", release.jobs.len());
    for job in &release.jobs {
        println!(
            "  {} {} [{}]",
            job.name,
            job.sha1,
            job.package_names().collect::<Vec<_>>().join(", ")
        );
    }
    println!("license:     {}", release.license.actual_sha1);
    for name in release.license.files.keys() {
        println!("  {name}");
    }
    Ok(EXIT_SUCCESS)
}

fn print_configs(release: &Release, json: bool) -> Result<u8, String> {
    let configs = release.unique_configs();
    if json {
        println!("{}", json_pretty(&configs)?);
        return Ok(EXIT_SUCCESS);
    }
    for config in configs.values() {
        let jobs: Vec<_> = config.jobs.iter().map(|j| j.name.as_str()).collect();
        println!(
            "{} ({}x: {})",
            config.name,
            config.usage_count,
            jobs.join(", ")
        );
        if !config.description.is_empty() {
            println!("  {}", config.description);
        }
    }
    Ok(EXIT_SUCCESS)
}
