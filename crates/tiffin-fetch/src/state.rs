use std::fmt;

/// What a download worker is doing right now.
///
/// Workers only ever move forward through these states and end in `Done` or
/// `Failed`; rendering to the human-readable token happens here, at the
/// display boundary, not in the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Queued,
    Fetching { percent: Option<u8> },
    CheckingHash,
    DeletingOld,
    Extracting,
    MakingExecutable { done: usize, total: usize },
    Done,
    Failed,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::Fetching { percent: None } => f.write_str("fetching"),
            Self::Fetching { percent: Some(percent) } => write!(f, "fetching ({percent:>3}%)"),
            Self::CheckingHash => f.write_str("checking hash"),
            Self::DeletingOld => f.write_str("deleting old files"),
            Self::Extracting => f.write_str("extracting"),
            Self::MakingExecutable { done, total } => {
                write!(f, "making files executable ({done}/{total})")
            }
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
        }
    }
}
