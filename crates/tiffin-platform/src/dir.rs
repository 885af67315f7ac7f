use std::env;
use std::path::PathBuf;

pub fn user_home() -> Option<PathBuf> {
    home::home_dir()
}

/// The per-user cache directory, honoring the platform convention.
pub fn user_cache() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        user_home().map(|p| p.join("Library/Caches"))
    }
    #[cfg(not(target_os = "macos"))]
    {
        env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| user_home().map(|p| p.join(".cache")))
    }
}
