//! Entry filters applied to an archive's flat entry stream.
//!
//! Archives store entries as a flat, ordered list of slash-separated names.
//! The three listing modes are expressed as one [`EntryFilter`] driving one
//! traversal, [`walk`]. The filter answers each entry with a [`Visit`]:
//! keep it, drop it, drop everything under its directory, or keep it and stop.

use anyhow::Result;
use std::collections::HashSet;

use super::Entry;

/// What the traversal should do with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// Leave the entry out.
    Skip,
    /// Keep the entry.
    Accept,
    /// Leave the entry out together with every later entry under this
    /// prefix (a `dir/` name).
    SkipDir(String),
    /// Keep the entry and end the traversal.
    Stop,
}

/// The three ways of selecting entries by path.
///
/// Paths are normalised archive paths (see [`crate::path::resolve`]):
/// rooted at `/`, with directories ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryFilter {
    /// Immediate children of a directory.
    Directory(String),
    /// Every descendant of a directory.
    Cascade(String),
    /// The one file at an exact path.
    File(String),
}

impl EntryFilter {
    /// Archive-relative prefix outside of which no entry is considered, if
    /// the filter narrows the iteration root.
    pub fn root(&self) -> Option<&str> {
        match self {
            EntryFilter::Cascade(dir) if dir != "/" => Some(dir.trim_start_matches('/')),
            _ => None,
        }
    }

    /// Judge one entry.
    pub fn visit(&self, entry: &Entry) -> Visit {
        match self {
            EntryFilter::Directory(dir) => visit_directory(dir, entry),
            EntryFilter::Cascade(_) => visit_cascade(self.root(), entry),
            EntryFilter::File(path) => visit_file(path, entry),
        }
    }
}

/// Keep names that sit exactly one level below `dir`: the remainder after the
/// prefix is a bare file name, or a directory name with its single slash at
/// the end.
fn visit_directory(dir: &str, entry: &Entry) -> Visit {
    let name = format!("/{}", entry.name_in_archive);
    let Some(rest) = name.strip_prefix(dir) else {
        return Visit::Skip;
    };
    let direct_child = match rest.find('/') {
        None => !rest.is_empty(),
        Some(i) => i == rest.len() - 1,
    };
    if direct_child {
        Visit::Accept
    } else {
        Visit::Skip
    }
}

/// Keep everything strictly below the iteration root.
fn visit_cascade(root: Option<&str>, entry: &Entry) -> Visit {
    match root {
        None => Visit::Accept,
        Some(root) if entry.name_in_archive.len() > root.len() => Visit::Accept,
        // The root directory's own entry.
        Some(_) => Visit::Skip,
    }
}

/// Find the entry named `path`; prune directories that cannot contain it.
fn visit_file(path: &str, entry: &Entry) -> Visit {
    if entry.is_dir {
        return Visit::Skip;
    }
    let path = path.strip_prefix('/').unwrap_or(path);
    let name = entry.name_in_archive.as_str();
    let parent = match name.rfind('/') {
        Some(i) => &name[..=i],
        None => "",
    };
    if !path.starts_with(parent) {
        return Visit::SkipDir(parent.to_string());
    }
    if path == name {
        Visit::Stop
    } else {
        Visit::Skip
    }
}

/// Every directory prefix of `name`, shortest first: `a/`, `a/b/` for `a/b/c`.
fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices('/').map(move |(i, _)| &name[..=i])
}

/// Run `filter` over `entries`, collecting what it keeps in encounter order.
///
/// Entries under a pruned prefix, or outside the filter's root, never reach
/// the filter. An error from the entry source aborts the traversal.
pub fn walk<I>(entries: I, filter: &EntryFilter) -> Result<Vec<Entry>>
where
    I: IntoIterator<Item = Result<Entry>>,
{
    let root = filter.root();
    let mut pruned: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();

    for entry in entries {
        let entry = entry?;
        let name = entry.name_in_archive.as_str();
        if root.is_some_and(|root| !name.starts_with(root)) {
            continue;
        }
        if !pruned.is_empty() && ancestors(name).any(|dir| pruned.contains(dir)) {
            continue;
        }
        match filter.visit(&entry) {
            Visit::Skip => {}
            Visit::Accept => kept.push(entry),
            Visit::SkipDir(prefix) => {
                // An empty prefix would prune the whole archive; root-level
                // files are never pruned.
                if !prefix.is_empty() {
                    pruned.insert(prefix);
                }
            }
            Visit::Stop => {
                kept.push(entry);
                break;
            }
        }
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn entries(names: &[&str]) -> Vec<Result<Entry>> {
        names.iter().map(|name| Ok(Entry::named(name))).collect()
    }

    fn names(entries: Vec<Entry>) -> Vec<String> {
        entries.into_iter().map(|e| e.name_in_archive).collect()
    }

    const TREE: &[&str] = &["a/", "a/b.txt", "a/c/", "a/c/d.txt"];

    #[test]
    fn directory_filter_keeps_one_level() {
        let found = walk(entries(TREE), &EntryFilter::Directory("/a/".into())).unwrap();
        assert_eq!(names(found), ["a/b.txt", "a/c/"]);
    }

    #[test]
    fn directory_filter_at_root_lists_top_level() {
        let tree = ["a/", "a/b.txt", "top.txt", "z/", "z/y/"];
        let found = walk(entries(&tree), &EntryFilter::Directory("/".into())).unwrap();
        assert_eq!(names(found), ["a/", "top.txt", "z/"]);
    }

    #[test]
    fn directory_filter_ignores_lookalike_prefixes() {
        let tree = ["ab/", "ab/x", "a/x"];
        let found = walk(entries(&tree), &EntryFilter::Directory("/a/".into())).unwrap();
        assert_eq!(names(found), ["a/x"]);
    }

    #[test]
    fn cascade_filter_keeps_the_subtree() {
        let mut tree = TREE.to_vec();
        tree.push("other/file");
        let found = walk(entries(&tree), &EntryFilter::Cascade("/a/".into())).unwrap();
        assert_eq!(names(found), ["a/b.txt", "a/c/", "a/c/d.txt"]);
    }

    #[test]
    fn cascade_filter_at_root_keeps_everything() {
        let found = walk(entries(TREE), &EntryFilter::Cascade("/".into())).unwrap();
        assert_eq!(names(found), TREE);
    }

    #[test]
    fn file_filter_finds_exact_match() {
        let found = walk(entries(TREE), &EntryFilter::File("/a/c/d.txt".into())).unwrap();
        assert_eq!(names(found), ["a/c/d.txt"]);

        let missing = walk(entries(TREE), &EntryFilter::File("/a/missing.txt".into())).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn file_filter_does_not_match_directories() {
        let found = walk(entries(TREE), &EntryFilter::File("/a/c".into())).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn file_filter_prunes_unrelated_directories() {
        let filter = EntryFilter::File("/a/c/d.txt".into());
        assert_eq!(
            filter.visit(&Entry::named("x/y.txt")),
            Visit::SkipDir("x/".into())
        );
        assert_eq!(filter.visit(&Entry::named("a/b.txt")), Visit::Skip);
        assert_eq!(filter.visit(&Entry::named("top.txt")), Visit::Skip);
    }

    #[test]
    fn file_filter_stops_at_the_first_match() {
        let source = vec![
            Ok(Entry::named("x/1")),
            Ok(Entry::named("x/2")),
            Ok(Entry::named("a/c/d.txt")),
            Err(anyhow!("never read")),
        ];
        let found = walk(source, &EntryFilter::File("/a/c/d.txt".into())).unwrap();
        assert_eq!(names(found), ["a/c/d.txt"]);
    }

    #[test]
    fn ancestors_are_directory_prefixes() {
        assert_eq!(ancestors("a/b/c.txt").collect::<Vec<_>>(), ["a/", "a/b/"]);
        assert_eq!(ancestors("a/b/").collect::<Vec<_>>(), ["a/", "a/b/"]);
        assert_eq!(ancestors("top.txt").count(), 0);
    }

    #[test]
    fn pruning_covers_nested_entries() {
        let tree = ["x/1", "x/y/2", "x/y/z/3", "a/c/d.txt"];
        let filter = EntryFilter::File("/a/c/d.txt".into());
        let found = walk(entries(&tree), &filter).unwrap();
        assert_eq!(names(found), ["a/c/d.txt"]);
    }

    #[test]
    fn file_lookup_scales_with_many_sibling_directories() {
        let dirs = 50_000;
        let mut source: Vec<Result<Entry>> = (0..dirs)
            .map(|i| Ok(Entry::named(&format!("d{i}/f.txt"))))
            .collect();
        source.push(Ok(Entry::named("target/x.txt")));

        let started = std::time::Instant::now();
        let found = walk(source, &EntryFilter::File("/target/x.txt".into())).unwrap();
        assert_eq!(names(found), ["target/x.txt"]);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(10),
            "walk took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn source_errors_abort_the_walk() {
        let source = vec![Ok(Entry::named("a/")), Err(anyhow!("corrupt header"))];
        assert!(walk(source, &EntryFilter::Cascade("/".into())).is_err());
    }
}
