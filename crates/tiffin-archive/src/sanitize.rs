use std::path::{Path, PathBuf};

/// Map an archive-internal path to an on-disk path under `destination`.
///
/// The path is canonicalized lexically (no symlink resolution; the
/// destination may not exist yet) and must sit at or under `root_prefix`.
/// Returns `None` for entries outside the root, which callers skip.
///
/// For any input, a returned path is under `destination`, including inputs
/// with `..` segments or absolute names.
pub fn resolve_entry_path(
    archive_path: &str,
    root_prefix: &str,
    destination: &Path,
) -> Option<PathBuf> {
    let canonical = clean(archive_path);
    let remainder = strip_root(&canonical, root_prefix)?;
    let resolved = if remainder.is_empty() {
        destination.to_path_buf()
    } else {
        destination.join(remainder)
    };
    // Backstop in case the root prefix itself smuggles in `..` segments.
    resolved.starts_with(destination).then_some(resolved)
}

/// Lexical path cleaning: drops empty and `.` segments, a `..` pops the
/// previous segment, and leading `..` segments of a relative path are kept
/// so escapes stay visible to the root check.
fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            normal => segments.push(normal),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Segment-aware prefix strip: `root/x` is under `root`, `root2/x` is not.
fn strip_root<'a>(canonical: &'a str, root_prefix: &str) -> Option<&'a str> {
    if canonical == root_prefix {
        return Some("");
    }
    canonical
        .strip_prefix(root_prefix)
        .and_then(|rest| rest.strip_prefix('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> &'static Path {
        Path::new("/cache/downloadedSources/demo")
    }

    #[test]
    fn plain_entry_lands_under_destination() {
        let resolved = resolve_entry_path("root/bin/tool", "root", dest()).unwrap();
        assert_eq!(resolved, dest().join("bin/tool"));
    }

    #[test]
    fn root_itself_maps_to_destination() {
        let resolved = resolve_entry_path("root", "root", dest()).unwrap();
        assert_eq!(resolved, dest());
        let resolved = resolve_entry_path("root/", "root", dest()).unwrap();
        assert_eq!(resolved, dest());
    }

    #[test]
    fn dot_segments_collapse() {
        let resolved = resolve_entry_path("root/./bin/../lib/x", "root", dest()).unwrap();
        assert_eq!(resolved, dest().join("lib/x"));
    }

    #[test]
    fn entries_outside_root_are_dropped() {
        assert_eq!(resolve_entry_path("other/bin/tool", "root", dest()), None);
        assert_eq!(resolve_entry_path("README", "root", dest()), None);
    }

    #[test]
    fn sibling_prefix_is_not_in_root() {
        assert_eq!(resolve_entry_path("root2/x", "root", dest()), None);
        assert_eq!(resolve_entry_path("roo/x", "root", dest()), None);
    }

    #[test]
    fn parent_escape_is_dropped() {
        assert_eq!(resolve_entry_path("../../evil", "root", dest()), None);
        assert_eq!(resolve_entry_path("root/../../evil", "root", dest()), None);
    }

    #[test]
    fn escape_laundered_through_root_is_dropped() {
        // Cleans to `../evil`, which no longer starts with the root.
        assert_eq!(
            resolve_entry_path("root/../../evil/../root/x/../../../evil", "root", dest()),
            None
        );
    }

    #[test]
    fn absolute_entry_is_dropped() {
        assert_eq!(resolve_entry_path("/etc/passwd", "root", dest()), None);
        assert_eq!(resolve_entry_path("/root/x", "root", dest()), None);
    }

    #[test]
    fn empty_root_admits_nothing_relative() {
        assert_eq!(resolve_entry_path("bin/tool", "", dest()), None);
    }

    #[test]
    fn nested_root_prefix() {
        let resolved = resolve_entry_path("pkg-1.0/dist/bin/x", "pkg-1.0/dist", dest()).unwrap();
        assert_eq!(resolved, dest().join("bin/x"));
    }

    #[test]
    fn clean_preserves_leading_parent_segments() {
        assert_eq!(clean("../a"), "../a");
        assert_eq!(clean("a/../../b"), "../b");
        assert_eq!(clean("a/b/../c"), "a/c");
        assert_eq!(clean("./a//b/."), "a/b");
        assert_eq!(clean("a/.."), ".");
        assert_eq!(clean("/../a"), "/a");
    }
}
