use crate::{io_at, StoreError};
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Peek at a buffered stream and report whether it starts with the gzip magic.
pub fn is_gzip<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    let buf = reader.fill_buf()?;
    Ok(buf.starts_with(&GZIP_MAGIC))
}

pub(crate) fn tar_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Tar {
        path: path.to_path_buf(),
        source,
    }
}

/// Visit every entry of a tar archive, wrapping read failures with the
/// archive's file name.
pub(crate) fn for_each_entry<R, F>(
    archive: &mut tar::Archive<R>,
    path: &Path,
    mut visit: F,
) -> Result<(), StoreError>
where
    R: Read,
    F: FnMut(&mut tar::Entry<'_, R>) -> Result<(), StoreError>,
{
    let entries = archive.entries().map_err(tar_err(path))?;
    for entry in entries {
        let mut entry = entry.map_err(tar_err(path))?;
        visit(&mut entry)?;
    }
    Ok(())
}

/// Unpack a tar archive, gzip-compressed or not, into a fresh subdirectory of
/// `dest_dir` named with `prefix`, and return that subdirectory.
///
/// On failure the partially populated subdirectory is removed.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
    prefix: &str,
) -> Result<PathBuf, StoreError> {
    let file = File::open(archive_path).map_err(io_at(archive_path))?;
    let mut reader = BufReader::new(file);

    let target = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(dest_dir)
        .map_err(io_at(dest_dir))?;

    if is_gzip(&mut reader).map_err(io_at(archive_path))? {
        unpack(tar::Archive::new(GzDecoder::new(reader)), archive_path, target.path())?;
    } else {
        unpack(tar::Archive::new(reader), archive_path, target.path())?;
    }

    let extracted = target.keep();
    debug!(
        "extracted {} into {}",
        archive_path.display(),
        extracted.display()
    );
    Ok(extracted)
}

fn unpack<R: Read>(
    mut archive: tar::Archive<R>,
    archive_path: &Path,
    target: &Path,
) -> Result<(), StoreError> {
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(false);
    archive.set_unpack_xattrs(false);
    archive.unpack(target).map_err(tar_err(archive_path))
}
