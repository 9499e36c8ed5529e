mod common;

use common::{ntp_release, tor_release, write_file, ReleaseFixture};
use roleforge_core::{Release, RoleManifest};
use std::path::{Path, PathBuf};

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
    releases: Vec<Release>,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let ntp = Release::load(ntp_release().write_final(&root.join("ntp"))).unwrap();
        let tor = Release::load(tor_release().write_final(&root.join("tor"))).unwrap();
        write_file(&root.join("scripts/environ.sh"), "export FOO=1\n");
        write_file(&root.join("scripts/myrole.sh"), "echo hello\n");
        write_file(&root.join("scripts/post.sh"), "echo done\n");
        Self {
            _dir: dir,
            root,
            releases: vec![ntp, tor],
        }
    }

    fn manifest(&self, yaml: &str) -> RoleManifest {
        let path = self.root.join("roles.yml");
        write_file(&path, yaml);
        RoleManifest::load(&path, &self.releases).unwrap()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

const ROLES: &str = r"
roles:
- name: myrole
  environment_scripts: [scripts/environ.sh]
  scripts: [scripts/myrole.sh, /opt/inside/container.sh]
  post_config_scripts: [scripts/post.sh]
  jobs:
  - name: tor
    release_name: tor
  - name: torproxy
    release_name: tor
  configuration:
    templates:
      properties.tor.port: '9050'
- name: foorole
  type: bosh-task
  jobs:
  - name: ntpd
    release_name: ntp
configuration:
  templates:
    properties.tor.hostname: localhost
    properties.tor.private_key: '((KEY))'
";

fn role_version(m: &RoleManifest, name: &str) -> String {
    m.lookup_role(name)
        .unwrap()
        .dev_version()
        .unwrap()
        .into_inner()
}

#[test]
fn signatures_are_deterministic() {
    let ws = Workspace::new();
    let a = ws.manifest(ROLES);
    let b = ws.manifest(ROLES);

    for name in ["myrole", "foorole"] {
        let v = role_version(&a, name);
        assert_eq!(v.len(), 40);
        assert!(v.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(v, role_version(&a, name));
        assert_eq!(v, role_version(&b, name));
    }
    let role = a.lookup_role("myrole").unwrap();
    assert_eq!(
        role.script_signature().unwrap(),
        b.lookup_role("myrole").unwrap().script_signature().unwrap()
    );
    assert_eq!(
        a.dev_package_version("salt").unwrap(),
        b.dev_package_version("salt").unwrap()
    );
}

#[test]
fn template_order_does_not_matter() {
    let ws = Workspace::new();
    let a = ws.manifest(ROLES);
    let reordered = ROLES.replace(
        "    properties.tor.hostname: localhost\n    properties.tor.private_key: '((KEY))'\n",
        "    properties.tor.private_key: '((KEY))'\n    properties.tor.hostname: localhost\n",
    );
    assert_ne!(reordered, ROLES);
    let b = ws.manifest(&reordered);

    assert_eq!(role_version(&a, "myrole"), role_version(&b, "myrole"));
}

#[test]
fn package_order_does_not_matter() {
    let ws = Workspace::new();
    // `tor` lists its packages as tor, openssl, libevent; `torproxy` as
    // libevent, openssl. The role sees each package once, sorted.
    let m = ws.manifest(ROLES);
    let role = m.lookup_role("myrole").unwrap();
    let names: Vec<_> = role.packages().iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["libevent", "openssl", "tor"]);
}

const TOR_ROLES: &str = r"
roles:
- name: proxy
  jobs:
  - name: tor
    release_name: tor
  - name: torproxy
    release_name: tor
configuration:
  templates:
    properties.tor.hostname: localhost
";

#[test]
fn package_declaration_order_does_not_change_versions() {
    let dir = tempfile::tempdir().unwrap();
    let reordered = ReleaseFixture::new("tor", "1.0.0")
        .package("libevent", &[])
        .package("openssl", &[])
        .package("tor", &["libevent", "openssl"])
        .job("tor", &["libevent", "tor", "openssl"], &[("tor.port", "listen port")])
        .job("torproxy", &["openssl", "libevent"], &[("tor.port", "proxy port")])
        .job("new_hostname", &[], &[]);

    let mut manifests = Vec::new();
    for (sub, fixture) in [("a", tor_release()), ("b", reordered)] {
        let root = dir.path().join(sub);
        let release = Release::load(fixture.write_final(&root.join("tor"))).unwrap();
        let roles = root.join("roles.yml");
        write_file(&roles, TOR_ROLES);
        manifests.push(RoleManifest::load(&roles, &[release]).unwrap());
    }

    let a_jobs: Vec<_> = manifests[0].roles[0].jobs[0].package_names().collect();
    let b_jobs: Vec<_> = manifests[1].roles[0].jobs[0].package_names().collect();
    assert_ne!(a_jobs, b_jobs);

    assert_eq!(
        role_version(&manifests[0], "proxy"),
        role_version(&manifests[1], "proxy")
    );
    assert_eq!(
        manifests[0].dev_package_version("").unwrap(),
        manifests[1].dev_package_version("").unwrap()
    );
}

#[test]
fn job_order_matters() {
    let ws = Workspace::new();
    let a = ws.manifest(ROLES);
    let swapped = ROLES.replace(
        "  - name: tor\n    release_name: tor\n  - name: torproxy\n    release_name: tor\n",
        "  - name: torproxy\n    release_name: tor\n  - name: tor\n    release_name: tor\n",
    );
    assert_ne!(swapped, ROLES);
    let b = ws.manifest(&swapped);

    assert_ne!(role_version(&a, "myrole"), role_version(&b, "myrole"));
    assert_ne!(
        a.dev_package_version("").unwrap(),
        b.dev_package_version("").unwrap()
    );
}

#[test]
fn script_content_change_is_detected() {
    let ws = Workspace::new();
    let m = ws.manifest(ROLES);
    let role = m.lookup_role("myrole").unwrap();
    let script_before = role.script_signature().unwrap();
    let role_before = role_version(&m, "myrole");
    let manifest_before = m.dev_package_version("").unwrap();

    write_file(&ws.path("scripts/post.sh"), "echo changed\n");

    assert_ne!(role.script_signature().unwrap(), script_before);
    assert_ne!(role_version(&m, "myrole"), role_before);
    assert_ne!(m.dev_package_version("").unwrap(), manifest_before);
    // Roles without scripts are unaffected.
    assert_eq!(
        role_version(&m, "foorole"),
        role_version(&ws.manifest(ROLES), "foorole")
    );
}

#[test]
fn template_value_change_is_detected() {
    let ws = Workspace::new();
    let a = ws.manifest(ROLES);
    let b = ws.manifest(&ROLES.replace("'9050'", "'9051'"));

    let ra = a.lookup_role("myrole").unwrap();
    let rb = b.lookup_role("myrole").unwrap();
    assert_ne!(ra.template_signature(), rb.template_signature());
    assert_ne!(role_version(&a, "myrole"), role_version(&b, "myrole"));
    assert_ne!(
        a.dev_package_version("").unwrap(),
        b.dev_package_version("").unwrap()
    );
}

#[test]
fn absolute_scripts_are_not_hashed() {
    let ws = Workspace::new();
    let with_abs = ws.manifest(ROLES);
    let without_abs = ws.manifest(&ROLES.replace(", /opt/inside/container.sh", ""));

    let a = with_abs.lookup_role("myrole").unwrap();
    let b = without_abs.lookup_role("myrole").unwrap();
    assert!(!a
        .script_paths()
        .values()
        .any(|p| p == Path::new("/opt/inside/container.sh")));
    assert_eq!(a.script_signature().unwrap(), b.script_signature().unwrap());
    assert_eq!(role_version(&with_abs, "myrole"), role_version(&without_abs, "myrole"));
}

#[test]
fn missing_script_file_is_an_error() {
    let ws = Workspace::new();
    let m = ws.manifest(&ROLES.replace("scripts/post.sh", "scripts/absent.sh"));
    let err = m.lookup_role("myrole").unwrap().dev_version().unwrap_err();
    assert!(err.to_string().contains("absent.sh"));
}

#[test]
fn manifest_version_depends_on_salt_and_role_order_is_irrelevant() {
    let ws = Workspace::new();
    let m = ws.manifest(ROLES);
    assert_ne!(
        m.dev_package_version("a").unwrap(),
        m.dev_package_version("b").unwrap()
    );

    let reordered = ws.manifest(
        r"
roles:
- name: foorole
  type: bosh-task
  jobs:
  - name: ntpd
    release_name: ntp
- name: myrole
  environment_scripts: [scripts/environ.sh]
  scripts: [scripts/myrole.sh, /opt/inside/container.sh]
  post_config_scripts: [scripts/post.sh]
  jobs:
  - name: tor
    release_name: tor
  - name: torproxy
    release_name: tor
  configuration:
    templates:
      properties.tor.port: '9050'
configuration:
  templates:
    properties.tor.private_key: '((KEY))'
    properties.tor.hostname: localhost
",
    );
    assert_eq!(
        m.dev_package_version("salt").unwrap(),
        reordered.dev_package_version("salt").unwrap()
    );
    let versions: Vec<_> = m
        .role_dev_versions()
        .unwrap()
        .into_iter()
        .map(|(role, _)| role.name.as_str())
        .collect();
    assert_eq!(versions, vec!["foorole", "myrole"]);
}

#[test]
fn package_signature_covers_dependencies() {
    let ws = Workspace::new();
    let tor = &ws.releases[1];
    let pkg = tor.lookup_package("tor").unwrap();
    let leaf = tor.lookup_package("openssl").unwrap();
    assert_eq!(pkg.signature(), pkg.signature());
    assert_ne!(pkg.signature(), leaf.signature());
    assert_eq!(pkg.transitive_dependencies().len(), 2);
}

#[cfg(unix)]
#[test]
fn script_signature_uses_raw_path_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    // both directory names render as "deploy-\u{fffd}" when decoded lossily
    let ws = Workspace::new();
    let mut signatures = Vec::new();
    for name in [&b"deploy-\xff"[..], &b"deploy-\xfe"[..]] {
        let base = ws.root.join(OsStr::from_bytes(name));
        write_file(&base.join("scripts/run.sh"), "echo run\n");
        let roles = base.join("roles.yml");
        write_file(&roles, "roles:\n- name: runner\n  scripts: [scripts/run.sh]\n");
        let m = RoleManifest::load(&roles, &ws.releases).unwrap();
        signatures.push(m.roles[0].script_signature().unwrap());
    }
    assert_ne!(signatures[0], signatures[1]);
}
