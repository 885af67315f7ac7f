use std::path::{Path, PathBuf};

use anyhow::Context;

/// Name of the tool's directory under the platform cache directory.
pub const CACHE_DIR_NAME: &str = "tiffin";

/// Layout of the content cache.
///
/// ```text
/// <root>/
///   sources/<name>.toml          source manifests (from the repo archive)
///   lib/<name>.toml              library manifests (from the repo archive)
///   downloadedSources/<name>/    extracted source contents
///   bin/<name>                   legacy symlinks, owned by the repo archive
/// ```
///
/// Everything is created lazily and is deletable without loss of
/// correctness.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The layout at the platform default location, used by `update`;
    /// `exec` derives the root from its anchor path instead.
    pub fn from_user_cache() -> anyhow::Result<Self> {
        let cache = tiffin_platform::user_cache()
            .context("failed to locate the user cache directory")?;
        Ok(Self::new(cache.join(CACHE_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    pub fn downloaded_sources_dir(&self) -> PathBuf {
        self.root.join("downloadedSources")
    }
}
