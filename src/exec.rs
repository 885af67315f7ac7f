use std::collections::HashMap;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::process::{Command, ExitCode};

use anyhow::{Context, Result};
use tiffin_fetch::{download_all, DownloadRequest};

use crate::cache::CacheLayout;
use crate::prompt;
use crate::resolver::{Resolution, Resolver};
use crate::MAX_PARALLEL_DOWNLOADS;

/// Resolve `executable` from `source_name`, download whatever is missing
/// (after confirmation), and replace this process with the binary.
///
/// Returns only when the user declines the download (success) or a
/// download fails (failure); on the happy path the exec never returns.
pub fn run(
    source_name: &str,
    executable: &str,
    layout: &CacheLayout,
    args: Vec<String>,
) -> Result<ExitCode> {
    let mut resolver = Resolver::new(layout);
    let binary = resolver.load_executable(source_name, executable)?;
    let resolution = resolver.into_resolution();

    let missing = resolution.missing_sources()?;
    if !missing.is_empty() {
        prompt::print_download_summary(&missing, source_name, executable);
        if !prompt::confirm_default_yes()? {
            return Ok(ExitCode::SUCCESS);
        }
        let requests = missing
            .iter()
            .map(|source| DownloadRequest {
                name: source.name.clone(),
                urls: source.urls.clone(),
                compression: source.compression,
                checksum: Some(source.checksum),
                root_path: source.root_path.clone(),
                destination: source.path.clone(),
                delete_existing: false,
                files_to_make_executable: source.files_to_make_executable.clone(),
            })
            .collect();
        let errors = download_all(requests, MAX_PARALLEL_DOWNLOADS);
        if !errors.is_empty() {
            // The supervisor already reported each failure on stderr.
            return Ok(ExitCode::FAILURE);
        }
    }

    let env = assemble_env(std::env::vars_os(), &resolution);
    let error = Command::new(&binary).args(&args).env_clear().envs(&env).exec();
    Err(error).with_context(|| format!("failed to execute the binary `{}`", binary.display()))
}

/// The child environment: the caller's environment, overlaid with the
/// manifest env entries, with `LD_LIBRARY_PATH` replaced by the resolved
/// library search path.
fn assemble_env(
    inherited: impl Iterator<Item = (OsString, OsString)>,
    resolution: &Resolution,
) -> HashMap<OsString, OsString> {
    let mut env: HashMap<OsString, OsString> = inherited.collect();
    for (name, value) in &resolution.env {
        env.insert(name.into(), value.into());
    }

    let mut search_path = OsString::new();
    for (index, directory) in resolution.library_directories().into_iter().enumerate() {
        if index > 0 {
            search_path.push(":");
        }
        search_path.push(directory.as_os_str());
    }
    env.insert("LD_LIBRARY_PATH".into(), search_path);
    env
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn os(value: &str) -> OsString {
        OsString::from(value)
    }

    fn resolution_with_libraries(directories: &[Option<&str>]) -> Resolution {
        let mut resolution = Resolution::default();
        for (index, directory) in directories.iter().enumerate() {
            resolution
                .libraries
                .insert(format!("lib{index}"), directory.map(PathBuf::from));
        }
        resolution
    }

    #[test]
    fn manifest_env_overrides_inherited_values() {
        let mut resolution = resolution_with_libraries(&[]);
        resolution.env.insert("EDITOR".to_string(), "from-manifest".to_string());

        let env = assemble_env(
            vec![(os("EDITOR"), os("inherited")), (os("HOME"), os("/home/me"))].into_iter(),
            &resolution,
        );

        assert_eq!(env.get(&os("EDITOR")), Some(&os("from-manifest")));
        assert_eq!(env.get(&os("HOME")), Some(&os("/home/me")));
    }

    #[test]
    fn library_path_replaces_the_inherited_value() {
        let resolution = resolution_with_libraries(&[Some("/cache/srcB/lib64")]);

        let env = assemble_env(
            vec![(os("LD_LIBRARY_PATH"), os("/stale"))].into_iter(),
            &resolution,
        );

        assert_eq!(env.get(&os("LD_LIBRARY_PATH")), Some(&os("/cache/srcB/lib64")));
    }

    #[test]
    fn library_path_deduplicates_and_skips_system_libraries() {
        let resolution = resolution_with_libraries(&[
            Some("/cache/b/lib"),
            None,
            Some("/cache/a/lib"),
            Some("/cache/b/lib"),
        ]);

        let env = assemble_env(std::iter::empty(), &resolution);

        assert_eq!(
            env.get(&os("LD_LIBRARY_PATH")),
            Some(&os("/cache/a/lib:/cache/b/lib"))
        );
    }

    #[test]
    fn no_libraries_still_overwrites_the_search_path() {
        let resolution = resolution_with_libraries(&[None]);
        let env = assemble_env(
            vec![(os("LD_LIBRARY_PATH"), os("/stale"))].into_iter(),
            &resolution,
        );
        assert_eq!(env.get(&os("LD_LIBRARY_PATH")), Some(&os("")));
    }
}
