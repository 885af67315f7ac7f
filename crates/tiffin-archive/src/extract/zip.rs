use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Result;
use crate::sanitize::resolve_entry_path;

use super::{ensure_dir, make_symlink, write_file};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Walk a zip archive, extracting the entries under `root_path`.
///
/// Zip has no symlink entry type; links are regular entries whose unix mode
/// carries the symlink file type and whose body is the target string.
pub(super) fn extract_zip<R: Read + Seek>(
    reader: R,
    destination: &Path,
    root_path: &str,
) -> Result<()> {
    let mut archive = zip::ZipArchive::new(reader)?;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let Some(out_path) = resolve_entry_path(file.name(), root_path, destination) else {
            continue;
        };

        if file.is_dir() {
            ensure_dir(&out_path, unix_perm(file.unix_mode(), 0o755))?;
        } else if file.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            file.read_to_string(&mut target)?;
            make_symlink(&target, &out_path)?;
        } else {
            let mode = unix_perm(file.unix_mode(), 0o644);
            write_file(&mut file, &out_path, mode)?;
        }
    }
    Ok(())
}

fn unix_perm(mode: Option<u32>, fallback: u32) -> u32 {
    mode.map(|m| m & 0o777).filter(|m| *m != 0).unwrap_or(fallback)
}
