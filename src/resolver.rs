use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tiffin_manifest::{resolve_source, ResolvedSource};

use crate::cache::CacheLayout;

/// Everything resolved while preparing one `exec`.
///
/// All four maps grow monotonically; asking for an already-loaded key is a
/// no-op, which both memoizes file reads and terminates cycles in the
/// library dependency graph.
#[derive(Debug, Default)]
pub struct Resolution {
    pub sources: HashMap<String, ResolvedSource>,
    /// Library name to its directory on disk; `None` when the host's
    /// loader provides it.
    pub libraries: HashMap<String, Option<PathBuf>>,
    visited_libraries: HashSet<String>,
    /// `"<source> <relpath>"` to the absolute binary path.
    pub executables: HashMap<String, PathBuf>,
    /// Env entries contributed by manifests, overlaid on the caller's
    /// environment at exec time.
    pub env: BTreeMap<String, String>,
}

impl Resolution {
    /// Resolved sources whose cache directories do not exist yet, in name
    /// order. A stat failure other than not-found is an error rather than
    /// a reinstall trigger.
    pub fn missing_sources(&self) -> Result<Vec<&ResolvedSource>> {
        let mut missing = Vec::new();
        for source in self.sources.values() {
            match fs::symlink_metadata(&source.path) {
                Ok(_) => {}
                Err(error) if error.kind() == io::ErrorKind::NotFound => missing.push(source),
                Err(error) => {
                    bail!("failed to stat `{}`: {error}", source.path.display())
                }
            }
        }
        missing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(missing)
    }

    /// Distinct non-system library directories for the loader search path.
    pub fn library_directories(&self) -> BTreeSet<&PathBuf> {
        self.libraries.values().flatten().collect()
    }
}

pub struct Resolver<'a> {
    layout: &'a CacheLayout,
    state: Resolution,
}

impl<'a> Resolver<'a> {
    pub fn new(layout: &'a CacheLayout) -> Self {
        Self { layout, state: Resolution::default() }
    }

    pub fn into_resolution(self) -> Resolution {
        self.state
    }

    /// Close over an executable: its backing source, its executable
    /// dependencies (recursively), its env entries, and its shared
    /// libraries. Returns the absolute binary path.
    pub fn load_executable(&mut self, source_name: &str, executable: &str) -> Result<PathBuf> {
        let key = format!("{source_name} {executable}");
        if let Some(path) = self.state.executables.get(&key) {
            return Ok(path.clone());
        }

        self.ensure_source(source_name)?;
        let source = &self.state.sources[source_name];
        let executable_path = source.path.join(executable);
        let dependencies = source.executable_dependencies.clone();
        let env_entries = source.env.get(executable).cloned().unwrap_or_default();
        let libraries = source
            .direct_shared_library_dependencies
            .get(executable)
            .cloned()
            .unwrap_or_default();

        for (dependency_source, dependency_executable) in &dependencies {
            self.load_executable(dependency_source, dependency_executable)?;
        }
        for (name, template) in env_entries {
            let value = self.expand_env_value(&template).with_context(|| {
                format!("in the env entry `{name}` of `{source_name}`")
            })?;
            self.state.env.insert(name, value);
        }
        for library in &libraries {
            self.load_library(library)?;
        }

        self.state.executables.insert(key, executable_path.clone());
        Ok(executable_path)
    }

    /// Env value templates interpolate `${NAME}` to source NAME's on-disk
    /// root, loading that source on demand.
    fn expand_env_value(&mut self, template: &str) -> Result<String> {
        tiffin_manifest::interpolate(template, |name| {
            self.ensure_source(name).map_err(|error| format!("{error:#}"))?;
            Ok(self.state.sources[name].path.display().to_string())
        })
        .map_err(anyhow::Error::new)
    }

    pub fn ensure_source(&mut self, name: &str) -> Result<()> {
        if self.state.sources.contains_key(name) {
            return Ok(());
        }
        let source = resolve_source(
            name,
            &self.layout.sources_dir(),
            &self.layout.downloaded_sources_dir(),
        )
        .with_context(|| format!("failed to load source `{name}`"))?;
        self.state.sources.insert(name.to_string(), source);
        Ok(())
    }

    pub fn load_library(&mut self, name: &str) -> Result<()> {
        // The visited set is inserted before recursing, so a cyclic library
        // graph terminates.
        if !self.state.visited_libraries.insert(name.to_string()) {
            return Ok(());
        }
        let library = tiffin_manifest::load_library(name, &self.layout.lib_dir())
            .with_context(|| format!("failed to load library `{name}`"))?;
        for dependency in &library.direct_shared_library_dependencies {
            self.load_library(dependency)?;
        }
        if library.is_system() {
            self.state.libraries.insert(name.to_string(), None);
        } else {
            self.ensure_source(&library.source)
                .with_context(|| format!("failed to load library `{name}`"))?;
            let directory = self.state.sources[&library.source].path.join(&library.directory);
            self.state.libraries.insert(name.to_string(), Some(directory));
        }
        Ok(())
    }
}
