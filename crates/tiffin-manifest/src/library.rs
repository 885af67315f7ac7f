use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ManifestError, Result};

/// The `source` value meaning "defer to the host's loader".
pub const SYSTEM_SOURCE: &str = "system";

/// A shared-library manifest: which source carries the library files, where
/// inside that source they live, and what the library itself links against.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryManifest {
    pub source: String,
    pub directory: String,
    pub direct_shared_library_dependencies: Vec<String>,
}

impl LibraryManifest {
    pub fn is_system(&self) -> bool {
        self.source == SYSTEM_SOURCE
    }
}

pub fn load_library(name: &str, lib_dir: &Path) -> Result<LibraryManifest> {
    let path = lib_dir.join(format!("{name}.toml"));
    let text = fs::read_to_string(&path)
        .map_err(|source| ManifestError::Read { path: path.clone(), source })?;
    toml::from_str(&text).map_err(|source| ManifestError::Parse { path, source })
}
