//! On-disk side of roleforge: release directory layout, package and job
//! archives, license archives, and SHA-1 integrity.
//!
//! Nothing here holds a file open past the call that opened it. Archives are
//! streamed through SHA-1 and tar/gzip decoders in a single pass.

pub mod archive;
pub mod digest;
pub mod integrity;
pub mod layout;
pub mod license;

pub use archive::{extract_archive, is_gzip};
pub use digest::{hex_digest, sha1_file, verify_sha1, HashingReader};
pub use integrity::{IntegrityFailure, IntegrityReport};
pub use layout::{default_dev_cache_dir, validate_path, ReleaseLayout};
pub use license::License;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} not found: {}", path.display())]
    MissingPath { what: &'static str, path: PathBuf },
    #[error("{what} is not a directory: {}", path.display())]
    NotADirectory { what: &'static str, path: PathBuf },
    #[error("{what} is a directory, expected a file: {}", path.display())]
    NotAFile { what: &'static str, path: PathBuf },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} could not be read: {source}", path.display())]
    Gzip {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}'s tar'd files failed to read: {source}", path.display())]
    Tar {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("SHA-1 mismatch for {}: expected {expected}, got {actual}", path.display())]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error(transparent)]
    Schema(#[from] roleforge_schema::SchemaError),
}

/// Adapter for `map_err` that attaches the path an I/O error happened on.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_names_what_and_where() {
        let e = StoreError::MissingPath {
            what: "packages directory",
            path: PathBuf::from("/r/packages"),
        };
        let msg = e.to_string();
        assert!(msg.contains("packages directory"));
        assert!(msg.contains("/r/packages"));
    }

    #[test]
    fn sha1_mismatch_shows_both_digests() {
        let e = StoreError::Sha1Mismatch {
            path: PathBuf::from("/cache/abc"),
            expected: "exp".to_owned(),
            actual: "act".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exp"));
        assert!(msg.contains("act"));
    }

    #[test]
    fn tar_error_names_archive() {
        let e = StoreError::Tar {
            path: PathBuf::from("/r/license.tgz"),
            source: std::io::Error::other("bad header"),
        };
        assert!(e.to_string().contains("/r/license.tgz's tar'd files failed to read"));
    }

    #[test]
    fn io_at_wraps_path() {
        let e = io_at(Path::new("/x/y"))(std::io::Error::other("boom"));
        assert!(matches!(e, StoreError::Io { ref path, .. } if path == Path::new("/x/y")));
    }
}
