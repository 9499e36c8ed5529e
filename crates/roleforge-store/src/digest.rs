use crate::{io_at, StoreError};
use roleforge_schema::Sha1Hex;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Reader adapter that feeds every byte it reads through a SHA-1 hasher, so
/// a stream can be decoded and hashed in one pass.
pub struct HashingReader<'h, R> {
    inner: R,
    hasher: &'h mut Sha1,
}

impl<'h, R: Read> HashingReader<'h, R> {
    pub fn new(inner: R, hasher: &'h mut Sha1) -> Self {
        Self { inner, hasher }
    }

    /// Read and hash whatever is left of the underlying stream.
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read> Read for HashingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

pub fn hex_digest(hasher: Sha1) -> Sha1Hex {
    Sha1Hex::new(hex::encode(hasher.finalize()))
}

/// Stream a file through SHA-1.
pub fn sha1_file(path: &Path) -> Result<Sha1Hex, StoreError> {
    let mut file = File::open(path).map_err(io_at(path))?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher).map_err(io_at(path))?;
    Ok(hex_digest(hasher))
}

/// Compare a file's SHA-1 against the recorded digest.
pub fn verify_sha1(path: &Path, expected: &str) -> Result<(), StoreError> {
    let actual = sha1_file(path)?;
    if actual != expected {
        return Err(StoreError::Sha1Mismatch {
            path: path.to_path_buf(),
            expected: expected.to_owned(),
            actual: actual.into_inner(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha1("hello world")
    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

    #[test]
    fn hashes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, b"hello world").unwrap();
        assert_eq!(sha1_file(&path).unwrap(), HELLO_SHA1);
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, b"hello world").unwrap();
        verify_sha1(&path, HELLO_SHA1).unwrap();
    }

    #[test]
    fn verify_rejects_altered_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, b"hello world").unwrap();
        let err = verify_sha1(&path, &format!("{HELLO_SHA1}foo")).unwrap_err();
        assert!(matches!(err, StoreError::Sha1Mismatch { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = sha1_file(Path::new("/nonexistent/blob")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn hashing_reader_matches_direct_hash() {
        let mut hasher = Sha1::new();
        let mut reader = HashingReader::new(&b"hello world"[..], &mut hasher);
        let mut first = [0u8; 5];
        reader.read_exact(&mut first).unwrap();
        reader.drain().unwrap();
        assert_eq!(hex_digest(hasher), HELLO_SHA1);
    }
}
