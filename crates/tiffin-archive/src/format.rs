use std::fmt;
use std::str::FromStr;

use crate::error::UnknownCompression;

/// Compression token from a source manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    TarGz,
    TarXz,
    TarZstd,
    TarBz2,
    Zip,
    /// Single gzipped file; the destination is the output file itself.
    Gzip,
    /// Raw bytes copied to the destination file.
    None,
}

impl Compression {
    pub fn is_single_file(self) -> bool {
        matches!(self, Self::Gzip | Self::None)
    }
}

impl FromStr for Compression {
    type Err = UnknownCompression;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ".tar.gz" => Ok(Self::TarGz),
            ".tar.xz" => Ok(Self::TarXz),
            ".tar.zst" => Ok(Self::TarZstd),
            ".tbz" => Ok(Self::TarBz2),
            ".zip" => Ok(Self::Zip),
            ".gz" => Ok(Self::Gzip),
            "none" => Ok(Self::None),
            other => Err(UnknownCompression(other.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TarGz => ".tar.gz",
            Self::TarXz => ".tar.xz",
            Self::TarZstd => ".tar.zst",
            Self::TarBz2 => ".tbz",
            Self::Zip => ".zip",
            Self::Gzip => ".gz",
            Self::None => "none",
        })
    }
}
