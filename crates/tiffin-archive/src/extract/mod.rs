use std::fs;
use std::io::{self, Cursor, Read};
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::Compression;

mod tar;
mod zip;

/// Extract `data` into `destination`.
///
/// For archive formats the destination is a directory and entries are
/// filtered through `root_path`; for `.gz` and `none` the destination is the
/// output file itself and `root_path` is unused.
///
/// The first I/O or format error aborts and propagates; any partially
/// written tree is left in place for the caller to inspect or remove.
pub fn extract(
    data: &[u8],
    compression: Compression,
    destination: &Path,
    root_path: &str,
) -> Result<()> {
    let cursor = Cursor::new(data);
    match compression {
        Compression::TarGz => {
            tar::extract_tar(flate2::read::GzDecoder::new(cursor), destination, root_path)
        }
        Compression::TarXz => {
            tar::extract_tar(xz2::read::XzDecoder::new(cursor), destination, root_path)
        }
        Compression::TarZstd => {
            tar::extract_tar(zstd::stream::read::Decoder::new(cursor)?, destination, root_path)
        }
        Compression::TarBz2 => {
            tar::extract_tar(bzip2::read::BzDecoder::new(cursor), destination, root_path)
        }
        Compression::Zip => zip::extract_zip(cursor, destination, root_path),
        Compression::Gzip => write_file(flate2::read::GzDecoder::new(cursor), destination, 0o644),
        Compression::None => write_file(cursor, destination, 0o644),
    }
}

/// mkdir -p with the given mode for every directory created.
fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|source| Error::CreateDir { path: path.to_path_buf(), source })
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent, 0o755),
        _ => Ok(()),
    }
}

/// Create `path` with the given mode and copy `reader` into it.
fn write_file<R: Read>(mut reader: R, path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    ensure_parent(path)?;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
        .map_err(|source| Error::WriteFile { path: path.to_path_buf(), source })?;
    io::copy(&mut reader, &mut file)
        .map_err(|source| Error::WriteFile { path: path.to_path_buf(), source })?;
    Ok(())
}

fn make_symlink(target: &str, link: &Path) -> Result<()> {
    ensure_parent(link)?;
    std::os::unix::fs::symlink(target, link)
        .map_err(|source| Error::Symlink { path: link.to_path_buf(), source })
}
