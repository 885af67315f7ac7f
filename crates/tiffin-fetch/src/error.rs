use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failure of a single fetch attempt; the worker falls back to the next
/// mirror on these.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
}

/// Fatal, aggregated download failures. Non-fatal conditions (a mirror down,
/// a checksum mismatch on one URL) are logged and retried, never returned.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("failed to download `{name}` from any mirror")]
    AllMirrorsFailed { name: String },

    #[error("failed to extract `{name}`: {source}")]
    Extract { name: String, source: tiffin_archive::Error },

    #[error("failed to install `{name}`: {source}")]
    Install { name: String, source: io::Error },

    #[error("failed to delete old files at {}: {source}", path.display())]
    DeleteOld { path: PathBuf, source: io::Error },

    #[error("failed to make `{file}` executable: {source}")]
    MakeExecutable { file: String, source: io::Error },
}
