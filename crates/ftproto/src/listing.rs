//! Directory listings (spec §3 "Directory listing", §4.2 `list_dir` /
//! `get_possible_paths`).

use std::fs;
use std::path::Path;

use util::probe::{self, PathKind};

/// The three disjoint basename lists a `list_dir` reply carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
    pub links: Vec<String>,
}

impl DirListing {
    /// Comma-space-joined, matching the wire encoding used for `dirs:`,
    /// `files:`, `links:` values and for `possible_paths:`.
    pub fn join(names: &[String]) -> String {
        names.join(", ")
    }

    pub fn split(value: &str) -> Vec<String> {
        if value.is_empty() {
            Vec::new()
        } else {
            value.split(", ").map(str::to_string).collect()
        }
    }
}

/// Lists `dir`, classifying every entry (spec's symlinks-are-always-Link
/// rule applies here too: a symlink to a directory is reported under
/// `links`, not `dirs`).
pub fn list_dir(dir: &Path) -> std::io::Result<DirListing> {
    let mut listing = DirListing::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        match probe::classify(&entry.path()) {
            PathKind::Dir => listing.dirs.push(name),
            PathKind::File => listing.files.push(name),
            PathKind::Link => listing.links.push(name),
            PathKind::NotExist => {}
        }
    }
    Ok(listing)
}

/// `get_possible_paths`: empty `path` lists the current directory;
/// otherwise lists `dirname(path)` filtered to entries whose name starts
/// with `basename(path)` (spec §4.2 "Tab completion").
pub fn possible_paths(path: &str) -> std::io::Result<Vec<String>> {
    let (dir, prefix) = util::path::dirname_basename(path);
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(prefix) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn lists_dirs_files_and_links_separately() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("f1"), b"abc").unwrap();
        std::os::unix::fs::symlink("f1", tmp.path().join("lnk")).unwrap();

        let listing = list_dir(tmp.path()).unwrap();
        assert_eq!(listing.dirs, vec!["sub".to_string()]);
        assert_eq!(listing.files, vec!["f1".to_string()]);
        assert_eq!(listing.links, vec!["lnk".to_string()]);
    }

    #[test]
    fn possible_paths_empty_string_lists_current_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::write(tmp.path().join("b"), b"").unwrap();
        let here = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        let result = possible_paths("");
        std::env::set_current_dir(here).unwrap();
        let mut names = result.unwrap();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn possible_paths_filters_by_basename_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("foo.txt"), b"").unwrap();
        fs::write(tmp.path().join("foobar"), b"").unwrap();
        fs::write(tmp.path().join("bar"), b"").unwrap();
        let prefix = tmp.path().join("foo");
        let names = possible_paths(prefix.to_str().unwrap()).unwrap();
        assert_eq!(names, vec!["foo.txt".to_string(), "foobar".to_string()]);
    }

    #[test]
    fn join_and_split_round_trip() {
        let names = vec!["a".to_string(), "b c".to_string()];
        let joined = DirListing::join(&names);
        assert_eq!(DirListing::split(&joined), names);
        assert_eq!(DirListing::split(""), Vec::<String>::new());
    }
}
