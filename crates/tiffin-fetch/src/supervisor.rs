use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::{stream, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use sha2::{Digest, Sha256};
use tiffin_archive::Compression;

use crate::client::Fetcher;
use crate::error::DownloadError;
use crate::pool::POOL;
use crate::state::DownloadState;

/// One unit of work: download, verify, and unpack a single source.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub name: String,
    /// Candidate URLs, tried in order until one yields verified bytes.
    pub urls: Vec<String>,
    pub compression: Compression,
    /// Expected sha-256 of the payload. `None` skips verification; the
    /// repository refresh downloads the checksum database itself.
    pub checksum: Option<[u8; 32]>,
    /// Archive-internal prefix selecting the useful payload.
    pub root_path: String,
    pub destination: PathBuf,
    /// Remove the destination before extracting, and extract in place
    /// rather than through a staging directory.
    pub delete_existing: bool,
    /// Archive-relative paths to chmod +x once extracted.
    pub files_to_make_executable: Vec<String>,
}

/// Frames are coalesced to roughly one redraw every 30ms.
const DRAW_RATE_HZ: u8 = 33;

/// Run every request to completion with at most `max_parallel` in flight,
/// returning the fatal errors.
///
/// Per-URL failures (a mirror down, a checksum mismatch) are logged and the
/// worker moves to the next URL; they only become fatal once every URL is
/// exhausted. A fatal error in one request never stops the others.
pub fn download_all(requests: Vec<DownloadRequest>, max_parallel: usize) -> Vec<DownloadError> {
    POOL.block_on(run_supervisor(requests, max_parallel))
}

async fn run_supervisor(
    requests: Vec<DownloadRequest>,
    max_parallel: usize,
) -> Vec<DownloadError> {
    let progress =
        MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(DRAW_RATE_HZ));
    let style = ProgressStyle::with_template("{prefix}: {msg}").ok();
    let fetcher = Arc::new(Fetcher::new());

    let workers = requests.into_iter().map(|request| {
        let bar = progress.add(ProgressBar::new_spinner().with_prefix(request.name.clone()));
        if let Some(style) = &style {
            bar.set_style(style.clone());
        }
        bar.set_message(DownloadState::Queued.to_string());
        let worker = Worker { fetcher: Arc::clone(&fetcher), progress: progress.clone(), bar };
        async move { worker.run(request).await }
    });

    stream::iter(workers)
        .buffer_unordered(max_parallel.max(1))
        .collect::<Vec<Vec<DownloadError>>>()
        .await
        .into_iter()
        .flatten()
        .collect()
}

struct Worker {
    fetcher: Arc<Fetcher>,
    progress: MultiProgress,
    bar: ProgressBar,
}

impl Worker {
    async fn run(self, request: DownloadRequest) -> Vec<DownloadError> {
        let mut errors = Vec::new();

        let Some(payload) = self.fetch_from_mirrors(&request).await else {
            let error = DownloadError::AllMirrorsFailed { name: request.name.clone() };
            self.log_error(&error);
            errors.push(error);
            self.finish(DownloadState::Failed);
            return errors;
        };

        if request.delete_existing {
            self.set_state(DownloadState::DeletingOld);
            if let Err(source) = remove_path(&request.destination) {
                let error =
                    DownloadError::DeleteOld { path: request.destination.clone(), source };
                self.log_error(&error);
                errors.push(error);
            }
        }

        self.set_state(DownloadState::Extracting);
        if let Err(error) = self.install(&request, payload).await {
            self.log_error(&error);
            errors.push(error);
            self.finish(DownloadState::Failed);
            return errors;
        }
        self.log_info(format!(
            "extracted `{}` into {}",
            request.name,
            request.destination.display()
        ));

        let total = request.files_to_make_executable.len();
        for (index, file) in request.files_to_make_executable.iter().enumerate() {
            self.set_state(DownloadState::MakingExecutable { done: index + 1, total });
            let absolute = request.destination.join(file);
            match make_executable(&absolute) {
                Ok(()) => self.log_info(format!("made `{}` executable", absolute.display())),
                Err(source) => {
                    let error = DownloadError::MakeExecutable { file: file.clone(), source };
                    self.log_error(&error);
                    errors.push(error);
                }
            }
        }

        self.finish(DownloadState::Done);
        errors
    }

    /// Walk the URL list until one yields bytes that pass verification.
    async fn fetch_from_mirrors(&self, request: &DownloadRequest) -> Option<Vec<u8>> {
        for url in &request.urls {
            self.set_state(DownloadState::Fetching { percent: None });
            let bar = self.bar.clone();
            let fetched = self
                .fetcher
                .fetch(url, move |read, total| {
                    let percent = (read.saturating_mul(100) / total).min(100) as u8;
                    bar.set_message(
                        DownloadState::Fetching { percent: Some(percent) }.to_string(),
                    );
                })
                .await;

            let bytes = match fetched {
                Ok(bytes) => bytes,
                Err(error) => {
                    self.log_error(format!(
                        "failed to fetch `{}` from `{url}`: {error}",
                        request.name
                    ));
                    continue;
                }
            };
            self.log_info(format!("fetched `{}` from `{url}`", request.name));

            if let Some(expected) = request.checksum {
                self.set_state(DownloadState::CheckingHash);
                let actual: [u8; 32] = Sha256::digest(&bytes).into();
                if actual != expected {
                    self.log_error(format!(
                        "expected the sha256 checksum of `{}` to be {}, got {}",
                        request.name,
                        hex::encode(expected),
                        hex::encode(actual)
                    ));
                    continue;
                }
                self.log_info(format!("verified `{}` against its sha256 checksum", request.name));
            }
            return Some(bytes);
        }
        None
    }

    async fn install(
        &self,
        request: &DownloadRequest,
        payload: Vec<u8>,
    ) -> Result<(), DownloadError> {
        let name = request.name.clone();
        let compression = request.compression;
        let root_path = request.root_path.clone();
        let destination = request.destination.clone();
        let in_place = request.delete_existing;
        match tokio::task::spawn_blocking(move || {
            install_payload(&payload, compression, &root_path, &destination, in_place, &name)
        })
        .await
        {
            Ok(result) => result,
            Err(join_error) => Err(DownloadError::Install {
                name: request.name.clone(),
                source: io::Error::other(join_error),
            }),
        }
    }

    fn set_state(&self, state: DownloadState) {
        self.bar.set_message(state.to_string());
    }

    fn finish(&self, state: DownloadState) {
        self.bar.finish_with_message(state.to_string());
    }

    fn log_info(&self, message: impl fmt::Display) {
        self.progress.suspend(|| println!("{message}"));
    }

    fn log_error(&self, message: impl fmt::Display) {
        self.progress.suspend(|| eprintln!("{message}"));
    }
}

/// Unpack verified bytes at the destination.
///
/// Fresh installs extract into a sibling staging directory and rename over
/// the destination, so a crash mid-extraction can never leave a
/// half-populated directory that later runs mistake for an installed
/// source. In-place mode serves the repository refresh, where the
/// destination was just deleted and a failure forces a clean re-fetch.
fn install_payload(
    payload: &[u8],
    compression: Compression,
    root_path: &str,
    destination: &Path,
    in_place: bool,
    name: &str,
) -> Result<(), DownloadError> {
    let extract_error =
        |source| DownloadError::Extract { name: name.to_string(), source };
    let install_error =
        |source| DownloadError::Install { name: name.to_string(), source };

    if in_place {
        return tiffin_archive::extract(payload, compression, destination, root_path)
            .map_err(extract_error);
    }

    let parent = destination.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(install_error)?;
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "staging".to_string());
    let staging = parent.join(format!(".{file_name}.partial"));

    remove_path(&staging).map_err(install_error)?;
    if !compression.is_single_file() {
        fs::create_dir_all(&staging).map_err(install_error)?;
    }
    tiffin_archive::extract(payload, compression, &staging, root_path).map_err(extract_error)?;
    remove_path(destination).map_err(install_error)?;
    fs::rename(&staging, destination).map_err(install_error)
}

/// Remove a file or directory tree; absent paths are fine.
fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
        Ok(metadata) => {
            if metadata.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            }
        }
    }
}

fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)
}
