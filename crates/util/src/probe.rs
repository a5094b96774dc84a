//! Path triage and the file attribute set (spec §3 "Path triage", "File
//! attribute set").

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// The classification of a path after `$VAR`/`~` expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Dir,
    Link,
    NotExist,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathKind::File => "file",
            PathKind::Dir => "dir",
            PathKind::Link => "link",
            PathKind::NotExist => "not_exist",
        };
        f.write_str(s)
    }
}

impl PathKind {
    /// Parses the wire representation used on `type:` reply lines.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(PathKind::File),
            "dir" => Some(PathKind::Dir),
            "link" => Some(PathKind::Link),
            "not_exist" => Some(PathKind::NotExist),
            _ => None,
        }
    }
}

/// Classifies an (already-expanded) path. Symlinks are always reported as
/// `Link`, never dereferenced first — a dangling symlink is still `Link`,
/// not `NotExist`.
pub fn classify(path: &Path) -> PathKind {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            if meta.file_type().is_symlink() {
                PathKind::Link
            } else if meta.is_dir() {
                PathKind::Dir
            } else {
                PathKind::File
            }
        }
        Err(_) => PathKind::NotExist,
    }
}

/// A single file attribute tag. Only `Executable` is defined today; the
/// set is represented as a comma-space-joined string on the wire so a
/// second tag can be added without a format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAttr {
    Executable,
}

impl fmt::Display for FileAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileAttr::Executable => "executable",
        })
    }
}

/// An unordered set of [`FileAttr`] tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttrSet(Vec<FileAttr>);

impl FileAttrSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, attr: FileAttr) -> bool {
        self.0.contains(&attr)
    }

    pub fn insert(&mut self, attr: FileAttr) {
        if !self.contains(attr) {
            self.0.push(attr);
        }
    }

    /// Probes the executable bit of a regular file already on disk.
    #[cfg(unix)]
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        use std::os::unix::fs::PermissionsExt;
        let mut set = Self::new();
        if meta.permissions().mode() & 0o111 != 0 {
            set.insert(FileAttr::Executable);
        }
        set
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_meta: &fs::Metadata) -> Self {
        Self::new()
    }

    /// Parses the comma-space-joined wire representation, e.g.
    /// `"executable"` or `""`.
    pub fn parse(s: &str) -> Self {
        let mut set = Self::new();
        for tag in s.split(", ").map(str::trim).filter(|t| !t.is_empty()) {
            if tag == "executable" {
                set.insert(FileAttr::Executable);
            }
        }
        set
    }

    /// Sets `a+x` on `path` when this set carries [`FileAttr::Executable`]
    /// (spec §4.2 "Executable preservation").
    #[cfg(unix)]
    pub fn apply_executable_bit(&self, path: &Path) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        if self.contains(FileAttr::Executable) {
            let mut perm = fs::metadata(path)?.permissions();
            perm.set_mode(perm.mode() | 0o111);
            fs::set_permissions(path, perm)?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn apply_executable_bit(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Display for FileAttrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn classifies_missing_path() {
        assert_eq!(classify(Path::new("/no/such/path/ssh2-test")), PathKind::NotExist);
    }

    #[test]
    fn classifies_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(classify(dir.path()), PathKind::Dir);
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert_eq!(classify(&file), PathKind::File);
    }

    #[test]
    fn classifies_dangling_symlink_as_link() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("l");
        std::os::unix::fs::symlink("/no/such/target", &link).unwrap();
        assert_eq!(classify(&link), PathKind::Link);
    }

    #[test]
    fn attr_set_round_trips_through_wire_format() {
        let mut set = FileAttrSet::new();
        set.insert(FileAttr::Executable);
        assert_eq!(set.to_string(), "executable");
        assert_eq!(FileAttrSet::parse("executable"), set);
        assert_eq!(FileAttrSet::parse(""), FileAttrSet::new());
    }

    #[test]
    fn apply_executable_bit_sets_a_plus_x() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
        let mut set = FileAttrSet::new();
        set.insert(FileAttr::Executable);
        set.apply_executable_bit(&file).unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
