//! Declarative source and library manifests.
//!
//! Manifests are TOML files consumed read-only. Loading a source resolves
//! its `${architecture}` / `${version.*}` templates against the host,
//! decodes the mandatory sha-256 checksum, and expands the mirror list into
//! concrete (shuffled) URLs.

pub use error::{ManifestError, Result};
pub use interpolate::{interpolate, InterpolationError};
pub use library::{load_library, LibraryManifest, SYSTEM_SOURCE};
pub use source::{
    license_summary, resolve_source, resolve_source_for_arch, ResolvedSource, SourceManifest,
};

mod error;
mod interpolate;
mod library;
mod source;
