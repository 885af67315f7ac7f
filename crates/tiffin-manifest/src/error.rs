use std::io;
use std::path::PathBuf;

use tiffin_archive::UnknownCompression;

use crate::interpolate::InterpolationError;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse manifest {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("source `{name}`: {source}")]
    Interpolation { name: String, source: InterpolationError },

    #[error("source `{name}`: no checksum listed for `{url}`; checksums are required")]
    MissingChecksum { name: String, url: String },

    #[error("source `{name}`: expected a 64 character sha256 checksum for `{url}`, got {len} characters")]
    ChecksumLength { name: String, url: String, len: usize },

    #[error("source `{name}`: invalid checksum hex: {source}")]
    ChecksumHex { name: String, source: hex::FromHexError },

    #[error("source `{name}`: {source}")]
    Compression { name: String, source: UnknownCompression },
}

pub type Result<T> = std::result::Result<T, ManifestError>;
