use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::seq::SliceRandom;
use serde::Deserialize;
use tiffin_archive::Compression;

use crate::error::{ManifestError, Result};
use crate::interpolate::interpolate;

/// A source manifest as authored, before host-specific resolution.
///
/// Every field is optional in the file; TOML decoding fills in empty
/// defaults so sparse manifests stay valid.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceManifest {
    pub url_in_mirror: String,
    pub mirrors: Vec<String>,
    pub compression: String,
    pub checksums: BTreeMap<String, String>,
    pub files_to_make_executable: Vec<String>,
    pub root_path: String,
    pub version: BTreeMap<String, String>,
    pub architecture_names: BTreeMap<String, String>,
    pub homepage: String,
    pub licenses: Vec<String>,
    pub description: String,
    pub env: BTreeMap<String, BTreeMap<String, String>>,
    pub direct_shared_library_dependencies: BTreeMap<String, Vec<String>>,
    pub executable_dependencies: Vec<(String, String)>,
    pub installation_warnings: Vec<String>,
    pub known_issues: Vec<String>,
}

/// A source resolved for this host: concrete URLs, decoded checksum, and
/// its directory in the content cache.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub name: String,
    /// Mirror URLs in download order, shuffled to spread load.
    pub urls: Vec<String>,
    pub checksum: [u8; 32],
    pub compression: Compression,
    pub root_path: String,
    /// `<cache>/downloadedSources/<name>`
    pub path: PathBuf,
    pub files_to_make_executable: Vec<String>,
    pub env: BTreeMap<String, BTreeMap<String, String>>,
    pub direct_shared_library_dependencies: BTreeMap<String, Vec<String>>,
    pub executable_dependencies: Vec<(String, String)>,
    pub installation_warnings: Vec<String>,
    pub known_issues: Vec<String>,
    pub license_summary: String,
}

pub fn resolve_source(
    name: &str,
    sources_dir: &Path,
    downloaded_dir: &Path,
) -> Result<ResolvedSource> {
    resolve_source_for_arch(name, sources_dir, downloaded_dir, tiffin_platform::host_arch())
}

pub fn resolve_source_for_arch(
    name: &str,
    sources_dir: &Path,
    downloaded_dir: &Path,
    host_arch: &str,
) -> Result<ResolvedSource> {
    let path = sources_dir.join(format!("{name}.toml"));
    let text = fs::read_to_string(&path)
        .map_err(|source| ManifestError::Read { path: path.clone(), source })?;
    let manifest: SourceManifest =
        toml::from_str(&text).map_err(|source| ManifestError::Parse { path, source })?;

    let architecture = manifest
        .architecture_names
        .get(host_arch)
        .cloned()
        .unwrap_or_else(|| host_arch.to_string());
    let mut lookup = |key: &str| -> std::result::Result<String, String> {
        if key == "architecture" {
            Ok(architecture.clone())
        } else if let Some(version_key) = key.strip_prefix("version.") {
            manifest
                .version
                .get(version_key)
                .cloned()
                .ok_or_else(|| format!("no key `{version_key}` in `version`"))
        } else {
            Err(format!(
                "expected `architecture`, or `version.` followed by a key in `version`, got `{key}`"
            ))
        }
    };

    let url_in_mirror = interpolate(&manifest.url_in_mirror, &mut lookup)
        .map_err(|source| ManifestError::Interpolation { name: name.to_string(), source })?;
    let root_path = interpolate(&manifest.root_path, &mut lookup)
        .map_err(|source| ManifestError::Interpolation { name: name.to_string(), source })?;

    let checksum_hex = manifest.checksums.get(&url_in_mirror).ok_or_else(|| {
        ManifestError::MissingChecksum { name: name.to_string(), url: url_in_mirror.clone() }
    })?;
    if checksum_hex.len() != 64 {
        return Err(ManifestError::ChecksumLength {
            name: name.to_string(),
            url: url_in_mirror,
            len: checksum_hex.len(),
        });
    }
    let decoded = hex::decode(checksum_hex)
        .map_err(|source| ManifestError::ChecksumHex { name: name.to_string(), source })?;
    let mut checksum = [0u8; 32];
    checksum.copy_from_slice(&decoded);

    let compression = Compression::from_str(&manifest.compression)
        .map_err(|source| ManifestError::Compression { name: name.to_string(), source })?;

    let mut urls: Vec<String> = manifest
        .mirrors
        .iter()
        .map(|mirror| format!("{mirror}/{url_in_mirror}"))
        .collect();
    urls.shuffle(&mut rand::rng());

    Ok(ResolvedSource {
        name: name.to_string(),
        urls,
        checksum,
        compression,
        root_path,
        path: downloaded_dir.join(name),
        files_to_make_executable: manifest.files_to_make_executable,
        env: manifest.env,
        direct_shared_library_dependencies: manifest.direct_shared_library_dependencies,
        executable_dependencies: manifest.executable_dependencies,
        installation_warnings: manifest.installation_warnings,
        known_issues: manifest.known_issues,
        license_summary: license_summary(&manifest.licenses),
    })
}

/// The sentence describing a source's licensing, shown at download
/// confirmation.
pub fn license_summary(licenses: &[String]) -> String {
    match licenses {
        [] => "with an unknown license".to_string(),
        [only] => format!("licensed under {only}"),
        _ => {
            let mut sorted: Vec<&str> = licenses.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            let last = sorted[sorted.len() - 1];
            let rest = &sorted[..sorted.len() - 1];
            if rest.len() == 1 {
                format!("licensed under {} and {last}", rest[0])
            } else {
                format!("licensed under {}, and {last}", rest.join(", "))
            }
        }
    }
}
