use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "tiffin",
    version,
    about = "A rootless package manager that downloads, verifies, and runs binaries on demand",
    long_about = None
)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Refresh the local copy of the package repository.
    Update,
    /// Resolve a source and run one of its executables.
    Exec(ExecArgs),
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Name of the source.
    pub source: String,
    /// Path of the executable within the source.
    pub executable: String,
    /// Either `--arg` followed by an argument for the executable, or the
    /// path `/usr/bin/env` appends when tiffin runs from a shebang like
    /// `#!/usr/bin/env -S tiffin exec SOURCE EXECUTABLE`; its grandparent
    /// directory is the tiffin cache.
    #[arg(allow_hyphen_values = true)]
    pub anchor: String,
    /// Remaining arguments, forwarded to the executable.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ExecInvocation {
    Run { cache_root: PathBuf, args: Vec<String> },
    /// Shell completion helpers probe shebang scripts with `-m …`; running
    /// the real executable would hang the caller's shell waiting on it, so
    /// this bails out immediately instead.
    CompletionProbe,
}

/// Interpret the tokens after `exec SOURCE EXECUTABLE`: collect `--arg`
/// values, then treat the final token as the invoking script path whose
/// grandparent is the cache root.
pub fn interpret_exec(anchor: String, rest: Vec<String>) -> anyhow::Result<ExecInvocation> {
    let mut args = Vec::new();
    let mut pending = anchor;
    let mut rest = rest.into_iter();
    while pending == "--arg" {
        let Some(value) = rest.next() else {
            bail!("expected a value after `--arg`");
        };
        let Some(next) = rest.next() else {
            bail!("expected `--arg` or the invoking script path after the `--arg` value");
        };
        args.push(value);
        pending = next;
    }
    if pending == "-m" {
        return Ok(ExecInvocation::CompletionProbe);
    }
    args.extend(rest);

    let mut cache_root = Path::new(&pending)
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    if cache_root.as_os_str().is_empty() {
        cache_root = PathBuf::from(".");
    }
    Ok(ExecInvocation::Run { cache_root, args })
}
