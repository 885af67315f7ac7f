use anyhow::{bail, Result};
use tiffin_archive::Compression;
use tiffin_fetch::{download_all, DownloadRequest};

use crate::cache::CacheLayout;
use crate::MAX_PARALLEL_DOWNLOADS;

/// Archive of the declarative package repository.
const REPOSITORY_URL: &str =
    "https://github.com/tiffin-pkgs/manifest-repository/archive/refs/heads/main.zip";
/// Top-level directory inside that archive.
const REPOSITORY_ROOT: &str = "manifest-repository-main";

/// Delete the cache root and re-extract the repository archive into it.
///
/// No checksum here: the repository is itself the checksum database. A
/// failed update leaves a partial cache, which the next update replaces
/// wholesale.
pub fn update(layout: &CacheLayout) -> Result<()> {
    println!("Fetching the package repository from {REPOSITORY_URL}");
    let request = DownloadRequest {
        name: "package repository".to_string(),
        urls: vec![REPOSITORY_URL.to_string()],
        compression: Compression::Zip,
        checksum: None,
        root_path: REPOSITORY_ROOT.to_string(),
        destination: layout.root().to_path_buf(),
        delete_existing: true,
        files_to_make_executable: Vec::new(),
    };
    let errors = download_all(vec![request], MAX_PARALLEL_DOWNLOADS);
    if !errors.is_empty() {
        bail!("failed to update the package repository");
    }
    Ok(())
}
