//! Normalisation of client-supplied archive paths.
//!
//! Every path a client sends is interpreted relative to the archive root
//! `/`. Explicit parent references are refused outright; whatever survives
//! is cleaned so that it can never name anything above the root.

use crate::error::{Error, Result};

/// Normalise `raw` into a root-anchored archive path.
///
/// Fails with [`Error::RelativePath`] for `..`, `../x`, `x/..` and `x/../y`.
/// Otherwise backslashes become slashes, empty and `.` segments are dropped,
/// and any remaining `..` pops a segment (the root's parent is the root).
/// Directory paths get exactly one trailing `/`; the root is just `/`.
///
/// ```
/// use rarchive::path::resolve;
///
/// assert_eq!(resolve("", true).unwrap(), "/");
/// assert_eq!(resolve("docs/./guide", true).unwrap(), "/docs/guide/");
/// assert_eq!(resolve("a//\\b", false).unwrap(), "/a/b");
/// assert!(resolve("../etc/passwd", false).is_err());
/// ```
pub fn resolve(raw: &str, want_directory: bool) -> Result<String> {
    if raw == ".." || raw.ends_with("/..") || raw.starts_with("../") || raw.contains("/../") {
        return Err(Error::RelativePath);
    }

    let raw = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if want_directory && path != "/" {
        path.push('/');
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_references_are_denied() {
        for raw in ["..", "../x", "a/..", "/a/..", "a/../b", "/../", "x/y/../../z"] {
            assert!(
                matches!(resolve(raw, false), Err(Error::RelativePath)),
                "{raw} should be denied"
            );
            assert!(matches!(resolve(raw, true), Err(Error::RelativePath)));
        }
    }

    #[test]
    fn root_forms_resolve_to_slash() {
        for raw in ["", "/", ".", "./", "//", "\\"] {
            assert_eq!(resolve(raw, true).unwrap(), "/", "{raw:?}");
        }
    }

    #[test]
    fn separators_and_dots_are_cleaned() {
        assert_eq!(resolve("a//\\b", false).unwrap(), "/a/b");
        assert_eq!(resolve("/a/./b/", false).unwrap(), "/a/b");
        assert_eq!(resolve("a/b", true).unwrap(), "/a/b/");
        assert_eq!(resolve("a/b///", true).unwrap(), "/a/b/");
    }

    #[test]
    fn dotted_names_are_not_parent_references() {
        assert_eq!(resolve("a/..b/c..", false).unwrap(), "/a/..b/c..");
        assert_eq!(resolve("...", false).unwrap(), "/...");
    }

    #[test]
    fn backslash_parents_cannot_escape_the_root() {
        assert_eq!(resolve("a\\..\\..\\b", false).unwrap(), "/b");
        assert_eq!(resolve("\\..\\", true).unwrap(), "/");
    }

    #[test]
    fn results_never_contain_parent_segments() {
        for raw in ["a\\..", "x/.\\..\\y", "\\..\\..\\..", "..\\a"] {
            let resolved = resolve(raw, false).unwrap();
            assert!(resolved.starts_with('/'));
            assert!(!resolved.split('/').any(|s| s == ".."), "{raw} -> {resolved}");
        }
    }
}
