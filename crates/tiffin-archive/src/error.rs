use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compression format `{0}`; expected `.tar.gz`, `.tar.xz`, `.tar.zst`, `.tbz`, `.zip`, `.gz`, or `none`")]
pub struct UnknownCompression(pub String);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    UnknownCompression(#[from] UnknownCompression),

    #[error("unknown entry type {kind} in `{path}`")]
    UnknownEntryType { kind: u8, path: String },

    #[error("entry `{path}` has no link target")]
    MissingLinkTarget { path: String },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("failed to create symlink {}: {source}", path.display())]
    Symlink { path: PathBuf, source: io::Error },

    #[error("failed to create hardlink {}: {source}", path.display())]
    Hardlink { path: PathBuf, source: io::Error },

    #[error("corrupt zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
