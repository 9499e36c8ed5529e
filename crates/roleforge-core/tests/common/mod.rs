//! On-disk release fixtures: final and dev releases with real tar.gz
//! archives, written into temporary directories.
#![allow(dead_code)]

use sha1::{Digest, Sha1};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

pub fn tgz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    let tar = builder.into_inner().unwrap();
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    std::io::Write::write_all(&mut enc, &tar).unwrap();
    enc.finish().unwrap()
}

pub struct FixturePackage {
    pub name: String,
    pub fingerprint: String,
    pub dependencies: Vec<String>,
    pub archive: Vec<u8>,
}

impl FixturePackage {
    pub fn sha1(&self) -> String {
        sha1_hex(&self.archive)
    }
}

pub struct FixtureJob {
    pub name: String,
    pub packages: Vec<String>,
    pub properties: Vec<(String, String)>,
    pub archive: Vec<u8>,
}

impl FixtureJob {
    pub fn sha1(&self) -> String {
        sha1_hex(&self.archive)
    }
}

/// Builder for a release directory.
pub struct ReleaseFixture {
    pub name: String,
    pub version: String,
    pub packages: Vec<FixturePackage>,
    pub jobs: Vec<FixtureJob>,
    pub license: Vec<u8>,
    pub declare_license_sha1: bool,
}

impl ReleaseFixture {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
            packages: Vec::new(),
            jobs: Vec::new(),
            license: tgz(&[
                ("./LICENSE", b"Apache License 2.0\n"),
                ("./NOTICE", b"Copyright the authors\n"),
                ("./README.md", b"not a license\n"),
            ]),
            declare_license_sha1: true,
        }
    }

    pub fn package(mut self, name: &str, deps: &[&str]) -> Self {
        let archive = tgz(&[
            ("packaging", format!("# build {name}\n").as_bytes()),
            ("src/README", name.as_bytes()),
        ]);
        self.packages.push(FixturePackage {
            name: name.to_owned(),
            fingerprint: sha1_hex(format!("fingerprint {name}").as_bytes()),
            dependencies: deps.iter().map(|d| (*d).to_owned()).collect(),
            archive,
        });
        self
    }

    pub fn job(mut self, name: &str, packages: &[&str], properties: &[(&str, &str)]) -> Self {
        let archive = tgz(&[
            ("job.MF", format!("name: {name}\n").as_bytes()),
            ("monit", b"check process\n"),
        ]);
        self.jobs.push(FixtureJob {
            name: name.to_owned(),
            packages: packages.iter().map(|p| (*p).to_owned()).collect(),
            properties: properties
                .iter()
                .map(|(n, d)| ((*n).to_owned(), (*d).to_owned()))
                .collect(),
            archive,
        });
        self
    }

    pub fn package_sha1(&self, name: &str) -> String {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .map(FixturePackage::sha1)
            .unwrap()
    }

    pub fn job_sha1(&self, name: &str) -> String {
        self.jobs
            .iter()
            .find(|j| j.name == name)
            .map(FixtureJob::sha1)
            .unwrap()
    }

    pub fn manifest(&self) -> String {
        let mut out = format!(
            "name: {}\nversion: \"{}\"\ncommit_hash: 0d8a7c2\nuncommitted_changes: false\n",
            self.name, self.version
        );
        if self.declare_license_sha1 {
            writeln!(out, "license:\n  sha1: \"{}\"", sha1_hex(&self.license)).unwrap();
        }
        out.push_str("packages:\n");
        for pkg in &self.packages {
            writeln!(
                out,
                "- name: {}\n  version: \"{}\"\n  fingerprint: \"{}\"\n  sha1: \"{}\"\n  dependencies: [{}]",
                pkg.name,
                pkg.fingerprint,
                pkg.fingerprint,
                pkg.sha1(),
                pkg.dependencies.join(", ")
            )
            .unwrap();
        }
        out.push_str("jobs:\n");
        for job in &self.jobs {
            writeln!(
                out,
                "- name: {}\n  version: \"{}\"\n  fingerprint: \"{}\"\n  sha1: \"{}\"\n  packages: [{}]",
                job.name,
                sha1_hex(job.name.as_bytes()),
                sha1_hex(job.name.as_bytes()),
                job.sha1(),
                job.packages.join(", ")
            )
            .unwrap();
            if job.properties.is_empty() {
                out.push_str("  properties: []\n");
            } else {
                out.push_str("  properties:\n");
                for (name, description) in &job.properties {
                    writeln!(out, "  - name: {name}\n    description: {description}").unwrap();
                }
            }
        }
        out
    }

    /// Lay the release out as a final release under `root`.
    pub fn write_final(&self, root: &Path) -> PathBuf {
        fs::create_dir_all(root.join("packages")).unwrap();
        fs::create_dir_all(root.join("jobs")).unwrap();
        fs::write(root.join("release.MF"), self.manifest()).unwrap();
        fs::write(root.join("license.tgz"), &self.license).unwrap();
        for pkg in &self.packages {
            fs::write(root.join("packages").join(pkg.sha1()), &pkg.archive).unwrap();
        }
        for job in &self.jobs {
            fs::write(root.join("jobs").join(job.sha1()), &job.archive).unwrap();
        }
        root.to_path_buf()
    }

    /// Lay the release out as a dev release under `root` with its archives in
    /// `cache_dir`.
    pub fn write_dev(&self, root: &Path, cache_dir: &Path) -> PathBuf {
        let manifests = root.join("dev_releases").join(&self.name);
        fs::create_dir_all(&manifests).unwrap();
        fs::create_dir_all(root.join("config")).unwrap();
        fs::create_dir_all(root.join("packages")).unwrap();
        fs::create_dir_all(root.join("jobs")).unwrap();
        fs::create_dir_all(cache_dir).unwrap();

        fs::write(
            root.join("config/dev.yml"),
            format!("---\ndev_name: {}\n", self.name),
        )
        .unwrap();
        fs::write(
            manifests.join("index.yml"),
            format!(
                "---\nbuilds:\n  aaa111:\n    version: \"0+dev.1\"\n  bbb222:\n    version: \"{}\"\n",
                self.version
            ),
        )
        .unwrap();
        fs::write(
            manifests.join(format!("{}-{}.yml", self.name, self.version)),
            self.manifest(),
        )
        .unwrap();
        fs::write(root.join("license.tgz"), &self.license).unwrap();
        for pkg in &self.packages {
            fs::write(cache_dir.join(pkg.sha1()), &pkg.archive).unwrap();
        }
        for job in &self.jobs {
            fs::write(cache_dir.join(job.sha1()), &job.archive).unwrap();
        }
        root.to_path_buf()
    }
}

/// The `ntp` release used across tests: one package, one job.
pub fn ntp_release() -> ReleaseFixture {
    ReleaseFixture::new("ntp", "2+dev.3")
        .package("ntp-4.2.8p2", &[])
        .job(
            "ntpd",
            &["ntp-4.2.8p2"],
            &[("ntp_conf", "ntpd configuration"), ("ntp.servers", "upstream servers")],
        )
}

/// A second release with a small package graph and several jobs.
pub fn tor_release() -> ReleaseFixture {
    ReleaseFixture::new("tor", "1.0.0")
        .package("libevent", &[])
        .package("openssl", &[])
        .package("tor", &["libevent", "openssl"])
        .job("tor", &["tor", "openssl", "libevent"], &[("tor.port", "listen port")])
        .job("torproxy", &["libevent", "openssl"], &[("tor.port", "proxy port")])
        .job("new_hostname", &[], &[])
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
