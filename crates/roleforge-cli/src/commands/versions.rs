use super::{core_err, json_pretty, spinner, spin_fail, spin_ok, Inputs, EXIT_SUCCESS};
use roleforge_core::RoleManifest;
use serde::Serialize;

#[derive(Serialize)]
struct RoleVersion<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    role_type: &'a str,
    jobs: Vec<&'a str>,
    dev_version: String,
}

#[derive(Serialize)]
struct VersionsReport<'a> {
    roles: Vec<RoleVersion<'a>>,
    salt: &'a str,
    manifest_version: String,
}

pub fn run(inputs: &Inputs, json: bool) -> Result<u8, String> {
    let manifest_path = inputs.role_manifest()?;
    let releases = inputs.load_releases(json)?;

    let pb = (!json).then(|| spinner("resolving roles"));
    let manifest = match RoleManifest::load(manifest_path, &releases) {
        Ok(m) => m,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "resolving roles");
            }
            return Err(core_err(e));
        }
    };
    if let Some(pb) = &pb {
        spin_ok(pb, &format!("{} roles", manifest.roles.len()));
    }

    let versions = manifest.role_dev_versions().map_err(core_err)?;
    let manifest_version = manifest
        .dev_package_version(&inputs.salt)
        .map_err(core_err)?;

    if json {
        let report = VersionsReport {
            roles: versions
                .iter()
                .map(|(role, version)| RoleVersion {
                    name: &role.name,
                    role_type: role.role_type.as_str(),
                    jobs: role.jobs.iter().map(|j| j.name.as_str()).collect(),
                    dev_version: version.to_string(),
                })
                .collect(),
            salt: &inputs.salt,
            manifest_version: manifest_version.into_inner(),
        };
        println!("{}", json_pretty(&report)?);
    } else {
        let width = versions
            .iter()
            .map(|(role, _)| role.name.len())
            .max()
            .unwrap_or(0);
        for (role, version) in &versions {
            println!("{:<width$}  {version}  ({})", role.name, role.role_type);
        }
        println!("manifest: {manifest_version}");
    }
    Ok(EXIT_SUCCESS)
}
