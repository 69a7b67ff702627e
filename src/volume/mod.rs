pub mod local;
pub mod memory;

pub use local::LocalVolume;
pub use memory::MemoryVolume;

use serde::Serialize;

use crate::common::errors::Result;

// ─── Core types ───────────────────────────────────────────────────────────────

/// Kind of object returned by a volume listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "dir"),
        }
    }
}

/// One file or directory record from a volume listing.
///
/// Entries are snapshots: every listing call produces fresh ones and
/// nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Volume-relative path, forward-slash separated, no leading slash
    pub path: String,
    pub kind: EntryKind,
    /// Modification time in epoch seconds
    pub mtime: i64,
    /// Size in bytes (files only)
    pub size: Option<u64>,
    pub basename: String,
    /// Lower-cased, dot-prefixed extension (may be compound, e.g. `.tar.gz`)
    pub extension: Option<String>,
}

impl Entry {
    pub fn file(path: impl Into<String>, mtime: i64, size: u64) -> Self {
        Self::new(path.into(), EntryKind::File, mtime, Some(size))
    }

    pub fn directory(path: impl Into<String>, mtime: i64) -> Self {
        Self::new(path.into(), EntryKind::Directory, mtime, None)
    }

    fn new(path: String, kind: EntryKind, mtime: i64, size: Option<u64>) -> Self {
        let path = normalize_path(&path);
        let basename = path.rsplit('/').next().unwrap_or_default().to_string();
        let extension = extension_of(&basename);
        Self {
            path,
            kind,
            mtime,
            size,
            basename,
            extension,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Abstract storage root the purge engine works against.
///
/// Paths are volume-relative and forward-slash separated. A path that does
/// not exist lists as empty rather than failing.
pub trait StorageVolume {
    /// Immediate contents of `path` (one level, not recursive)
    fn list(&self, path: &str) -> Result<Vec<Entry>>;

    /// Every file anywhere below `path`; used for emptiness checks
    fn list_files(&self, path: &str) -> Result<Vec<Entry>>;

    fn delete(&self, path: &str) -> Result<()>;

    /// Remove a directory together with whatever it still contains
    fn delete_directory(&self, path: &str) -> Result<()>;
}

impl<V: StorageVolume + ?Sized> StorageVolume for &V {
    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        (**self).list(path)
    }

    fn list_files(&self, path: &str) -> Result<Vec<Entry>> {
        (**self).list_files(path)
    }

    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        (**self).delete_directory(path)
    }
}

/// Collapse separators and `.` segments, drop leading and trailing slashes.
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a normalized directory path and a child name.
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn extension_of(basename: &str) -> Option<String> {
    let stem = basename.trim_start_matches('.');
    stem.find('.')
        .map(|idx| stem[idx..].to_lowercase())
        .filter(|ext| ext.len() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path("/dir1//subdir/"), "dir1/subdir");
        assert_eq!(normalize_path("./a/./b"), "a/b");
        assert_eq!(normalize_path("a\\b"), "a/b");
    }

    #[test]
    fn test_entry_fields() {
        let entry = Entry::file("/logs/Archive.TAR.gz", 10, 3);
        assert_eq!(entry.path, "logs/Archive.TAR.gz");
        assert_eq!(entry.basename, "Archive.TAR.gz");
        assert_eq!(entry.extension.as_deref(), Some(".tar.gz"));
        assert!(entry.is_file());

        let hidden = Entry::file(".gitignore", 0, 0);
        assert_eq!(hidden.extension, None);

        let dir = Entry::directory("a/b/", 0);
        assert_eq!(dir.basename, "b");
        assert!(dir.is_dir());
        assert_eq!(dir.size, None);
    }
}
