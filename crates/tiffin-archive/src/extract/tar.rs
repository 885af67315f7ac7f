use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::sanitize::resolve_entry_path;

use super::{ensure_dir, ensure_parent, make_symlink, write_file};

/// Walk a tar stream, extracting the entries under `root_path`.
///
/// Symlink targets are written verbatim (dangling links are fine; they
/// resolve at use time). Hardlink targets go through the same path
/// translation as entry names and out-of-root targets drop the entry.
pub(super) fn extract_tar<R: Read>(reader: R, destination: &Path, root_path: &str) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let Some(out_path) = resolve_entry_path(&raw_path, root_path, destination) else {
            continue;
        };

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            ensure_dir(&out_path, 0o755)?;
        } else if entry_type.is_symlink() {
            let target = link_target(&entry, &raw_path)?;
            make_symlink(&target, &out_path)?;
        } else if entry_type.is_hard_link() {
            let target = link_target(&entry, &raw_path)?;
            let Some(link_target) = resolve_entry_path(&target, root_path, destination) else {
                continue;
            };
            ensure_parent(&out_path)?;
            fs::hard_link(&link_target, &out_path)
                .map_err(|source| Error::Hardlink { path: out_path.clone(), source })?;
        } else if entry_type.is_file() {
            let mode = entry.header().mode()? & 0o777;
            write_file(&mut entry, &out_path, mode)?;
        } else {
            return Err(Error::UnknownEntryType {
                kind: entry_type.as_byte(),
                path: raw_path,
            });
        }
    }
    Ok(())
}

fn link_target<R: Read>(entry: &tar::Entry<'_, R>, raw_path: &str) -> Result<String> {
    let bytes = entry
        .link_name_bytes()
        .ok_or_else(|| Error::MissingLinkTarget { path: raw_path.to_string() })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
