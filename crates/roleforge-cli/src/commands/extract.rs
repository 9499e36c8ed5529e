use super::{core_err, json_pretty, load_release, EXIT_SUCCESS};
use roleforge_schema::ReleaseSource;
use std::path::Path;

pub fn run(
    path: &Path,
    dev: bool,
    cache_dir: Option<&Path>,
    package: &str,
    dest: &Path,
    json: bool,
) -> Result<u8, String> {
    let source = if dev {
        ReleaseSource::dev_release(path, cache_dir.map(Path::to_path_buf))
    } else {
        ReleaseSource::final_release(path)
    };
    let release = load_release(&source).map_err(core_err)?;
    let pkg = release.lookup_package(package).map_err(core_err)?;
    pkg.validate_sha1().map_err(core_err)?;
    let extracted = pkg.extract(dest).map_err(core_err)?;

    if json {
        let payload = serde_json::json!({
            "release": release.name,
            "package": pkg.name,
            "sha1": pkg.sha1,
            "path": extracted,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{}", extracted.display());
    }
    Ok(EXIT_SUCCESS)
}
