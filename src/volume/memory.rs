use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{normalize_path, Entry, EntryKind, StorageVolume};
use crate::common::errors::{PurgeError, Result};

#[derive(Debug, Clone)]
struct Node {
    kind: EntryKind,
    mtime: i64,
    size: u64,
}

/// In-memory volume.
///
/// Useful for exercising the engines without touching disk: deletes can be
/// made to fail for chosen paths and every `list` call is recorded.
#[derive(Debug, Default)]
pub struct MemoryVolume {
    nodes: RefCell<BTreeMap<String, Node>>,
    failing: BTreeSet<String>,
    listings: RefCell<Vec<String>>,
}

impl MemoryVolume {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating missing parent directories
    pub fn with_file(self, path: &str, mtime: i64) -> Self {
        self.insert(path, EntryKind::File, mtime, 0);
        self
    }

    pub fn with_sized_file(self, path: &str, mtime: i64, size: u64) -> Self {
        self.insert(path, EntryKind::File, mtime, size);
        self
    }

    /// Add an (empty) directory, creating missing parents
    pub fn with_dir(self, path: &str) -> Self {
        self.insert(path, EntryKind::Directory, 0, 0);
        self
    }

    /// Make `delete`/`delete_directory` fail for this path
    pub fn failing_delete(mut self, path: &str) -> Self {
        self.failing.insert(normalize_path(path));
        self
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.borrow().contains_key(&normalize_path(path))
    }

    /// All file paths, sorted
    pub fn files(&self) -> Vec<String> {
        self.paths_of(EntryKind::File)
    }

    /// All directory paths, sorted
    pub fn dirs(&self) -> Vec<String> {
        self.paths_of(EntryKind::Directory)
    }

    /// Paths passed to `list`, in call order
    pub fn listings(&self) -> Vec<String> {
        self.listings.borrow().clone()
    }

    fn paths_of(&self, kind: EntryKind) -> Vec<String> {
        self.nodes
            .borrow()
            .iter()
            .filter(|(_, node)| node.kind == kind)
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn insert(&self, path: &str, kind: EntryKind, mtime: i64, size: u64) {
        let path = normalize_path(path);
        let mut nodes = self.nodes.borrow_mut();

        let mut parent = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            parent = super::join_path(&parent, segment);
            nodes.entry(parent.clone()).or_insert(Node {
                kind: EntryKind::Directory,
                mtime: 0,
                size: 0,
            });
        }

        nodes.insert(path, Node { kind, mtime, size });
    }

    fn to_entry(path: &str, node: &Node) -> Entry {
        match node.kind {
            EntryKind::File => Entry::file(path, node.mtime, node.size),
            EntryKind::Directory => Entry::directory(path, node.mtime),
        }
    }

    fn is_below(path: &str, dir: &str) -> bool {
        dir.is_empty() || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
    }

    fn check_failing(&self, path: &str) -> Result<()> {
        if self.failing.contains(path) {
            return Err(PurgeError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "delete refused"),
            ));
        }
        Ok(())
    }

    fn not_found(path: &str) -> PurgeError {
        PurgeError::io(path, std::io::Error::from(std::io::ErrorKind::NotFound))
    }
}

impl StorageVolume for MemoryVolume {
    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = normalize_path(path);
        self.listings.borrow_mut().push(dir.clone());

        let nodes = self.nodes.borrow();
        if !dir.is_empty() && nodes.get(&dir).map(|n| n.kind) != Some(EntryKind::Directory) {
            return Ok(Vec::new());
        }

        Ok(nodes
            .iter()
            .filter(|(candidate, _)| {
                Self::is_below(candidate, &dir)
                    && !candidate[if dir.is_empty() { 0 } else { dir.len() + 1 }..].contains('/')
            })
            .map(|(candidate, node)| Self::to_entry(candidate, node))
            .collect())
    }

    fn list_files(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = normalize_path(path);
        Ok(self
            .nodes
            .borrow()
            .iter()
            .filter(|(candidate, node)| {
                node.kind == EntryKind::File && Self::is_below(candidate, &dir)
            })
            .map(|(candidate, node)| Self::to_entry(candidate, node))
            .collect())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        self.check_failing(&path)?;
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(&path) {
            Some(node) if node.kind == EntryKind::File => {
                nodes.remove(&path);
                Ok(())
            }
            _ => Err(Self::not_found(&path)),
        }
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        self.check_failing(&path)?;
        let mut nodes = self.nodes.borrow_mut();
        if path.is_empty() || nodes.get(&path).map(|n| n.kind) != Some(EntryKind::Directory) {
            return Err(Self::not_found(&path));
        }
        nodes.retain(|candidate, _| candidate != &path && !Self::is_below(candidate, &path));
        Ok(())
    }
}
