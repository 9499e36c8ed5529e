use crate::archive::{for_each_entry, is_gzip, tar_err};
use crate::digest::{hex_digest, HashingReader};
use crate::{io_at, StoreError};
use flate2::bufread::GzDecoder;
use roleforge_schema::Sha1Hex;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// License and notice files of a release, plus the archive's checksums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct License {
    /// Checksum declared in the release manifest, if any.
    pub sha1: Option<Sha1Hex>,
    /// Checksum of the archive bytes as read.
    pub actual_sha1: Sha1Hex,
    /// Base file name to raw contents.
    pub files: BTreeMap<String, Vec<u8>>,
}

impl License {
    /// Read a gzip-compressed tar of license files, hashing the archive bytes
    /// in the same pass. Only entries whose path mentions "license" or
    /// "notice" (any case) are kept.
    ///
    /// The declared checksum is recorded, not enforced; see [`License::verify`].
    pub fn load(archive_path: &Path, declared: Option<Sha1Hex>) -> Result<Self, StoreError> {
        let file = File::open(archive_path).map_err(io_at(archive_path))?;
        let mut hasher = Sha1::new();
        let mut files = BTreeMap::new();

        {
            let mut reader = BufReader::new(HashingReader::new(file, &mut hasher));
            let gzipped = is_gzip(&mut reader).map_err(io_at(archive_path))?;
            if !gzipped {
                return Err(StoreError::Gzip {
                    path: archive_path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::InvalidData, "not in gzip format"),
                });
            }

            let mut archive = tar::Archive::new(GzDecoder::new(reader));
            for_each_entry(&mut archive, archive_path, |entry| {
                if !entry.header().entry_type().is_file() {
                    return Ok(());
                }
                let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
                if !is_license_file(&name) {
                    return Ok(());
                }
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf).map_err(tar_err(archive_path))?;
                let base = Path::new(&name)
                    .file_name()
                    .map_or_else(|| name.clone(), |n| n.to_string_lossy().into_owned());
                files.insert(base, buf);
                Ok(())
            })?;

            // Hash trailing bytes the decoders never asked for.
            let mut rest = archive.into_inner().into_inner().into_inner();
            rest.drain().map_err(io_at(archive_path))?;
        }

        let actual_sha1 = hex_digest(hasher);
        debug!(
            "loaded {} license file(s) from {} (sha1 {actual_sha1})",
            files.len(),
            archive_path.display()
        );

        Ok(Self {
            sha1: declared,
            actual_sha1,
            files,
        })
    }

    /// Compare the archive checksum against the declared one. A license with
    /// no declared checksum passes.
    pub fn verify(&self, archive_path: &Path) -> Result<(), StoreError> {
        match &self.sha1 {
            Some(declared) if *declared != self.actual_sha1 => Err(StoreError::Sha1Mismatch {
                path: archive_path.to_path_buf(),
                expected: declared.to_string(),
                actual: self.actual_sha1.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn is_license_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("license") || lower.contains("notice")
}
