use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{join_path, normalize_path, Entry, StorageVolume};
use crate::common::errors::{PurgeError, Result};

/// A volume backed by a directory on the local filesystem.
///
/// Symbolic links are skipped: they are neither traversed nor deleted.
/// A directory still holding one (or any other special file) is never
/// removed.
#[derive(Debug, Clone)]
pub struct LocalVolume {
    root: PathBuf,
}

impl LocalVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a volume-relative path
    pub fn resolve(&self, path: &str) -> PathBuf {
        let relative = normalize_path(path);
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    fn relative(&self, absolute: &Path) -> String {
        let stripped = absolute.strip_prefix(&self.root).unwrap_or(absolute);
        normalize_path(&stripped.to_string_lossy())
    }
}

impl StorageVolume for LocalVolume {
    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let base = normalize_path(path);
        let mut entries = Vec::new();

        for item in std::fs::read_dir(&dir).map_err(|e| PurgeError::io(&dir, e))? {
            let item = item.map_err(|e| PurgeError::io(&dir, e))?;
            let file_type = match item.file_type() {
                Ok(t) => t,
                Err(_) => continue,
            };
            if file_type.is_symlink() {
                continue;
            }

            // Entry may vanish between readdir and stat
            let metadata = match item.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };

            let name = item.file_name().to_string_lossy().to_string();
            let entry_path = join_path(&base, &name);
            let mtime = mtime_of(&metadata);

            if file_type.is_dir() {
                entries.push(Entry::directory(entry_path, mtime));
            } else if file_type.is_file() {
                entries.push(Entry::file(entry_path, mtime, metadata.len()));
            }
        }

        entries.sort_by(|a, b| a.basename.cmp(&b.basename));
        Ok(entries)
    }

    fn list_files(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for item in WalkDir::new(&dir).follow_links(false).min_depth(1) {
            let item = item.map_err(|e| {
                let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                PurgeError::io(at, e.into())
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let metadata = match item.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            files.push(Entry::file(
                self.relative(item.path()),
                mtime_of(&metadata),
                metadata.len(),
            ));
        }

        Ok(files)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        std::fs::remove_file(&target).map_err(|e| PurgeError::io(&target, e))
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        if target == self.root {
            return Err(PurgeError::io(
                &target,
                std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "refusing to remove the volume root",
                ),
            ));
        }
        if let Some(link) = first_non_regular(&target)? {
            return Err(PurgeError::io(
                &link,
                std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "directory holds a symbolic link or special file",
                ),
            ));
        }
        std::fs::remove_dir_all(&target).map_err(|e| PurgeError::io(&target, e))
    }
}

/// First entry below `dir` that is neither a directory nor a regular file
fn first_non_regular(dir: &Path) -> Result<Option<PathBuf>> {
    for item in WalkDir::new(dir).follow_links(false).min_depth(1) {
        let item = item.map_err(|e| {
            let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            PurgeError::io(at, e.into())
        })?;
        let file_type = item.file_type();
        if !file_type.is_dir() && !file_type.is_file() {
            return Ok(Some(item.into_path()));
        }
    }
    Ok(None)
}

fn mtime_of(metadata: &Metadata) -> i64 {
    metadata
        .modified()
        .map(|t| DateTime::<Utc>::from(t).timestamp())
        .unwrap_or(0)
}
