//! Archive extraction for the content cache.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Lexical path translation (traversal prevention)
//! - `format.rs` - Compression format tokens
//! - `extract/` - Per-format extraction
//!
//! Entries outside the archive's root prefix are dropped, not errors: the
//! root prefix selects the useful payload as well as guarding the cache.

pub use error::{Error, Result, UnknownCompression};
pub use extract::extract;
pub use format::Compression;
pub use sanitize::resolve_entry_path;

mod error;
mod extract;
mod format;
mod sanitize;
