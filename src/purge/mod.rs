pub mod callback;
pub mod expander;
pub mod report;

pub use callback::{Decision, DecisionCallback, UseDefaults};
pub use expander::expand;
pub use report::{CandidateRecord, PurgeReport};

use tracing::{debug, info, warn};

use crate::rules::RuleSet;
use crate::volume::{Entry, EntryKind, StorageVolume};
use callback::consult;
use expander::list_or_empty;

/// Applies a [`RuleSet`] to a [`StorageVolume`].
///
/// Traversal is depth-first and strictly sequential. Within one directory
/// files are decided first, subdirectories are recursed into (when
/// `recursive` is set), and only then are pending subdirectories checked
/// for emptiness, so nested directories emptied by the same run are
/// removed bottom-up.
pub struct PurgeEngine<'a, V: StorageVolume + ?Sized> {
    rules: &'a RuleSet,
    volume: &'a V,
}

impl<'a, V: StorageVolume + ?Sized> PurgeEngine<'a, V> {
    pub fn new(rules: &'a RuleSet, volume: &'a V) -> Self {
        Self { rules, volume }
    }

    /// Purge with the computed defaults. Returns the number of files and
    /// directories deleted.
    pub fn purge(&self) -> usize {
        self.purge_with(&mut UseDefaults)
    }

    /// Purge, consulting `callback` once for every candidate entry.
    pub fn purge_with<C>(&self, callback: &mut C) -> usize
    where
        C: DecisionCallback<Entry> + ?Sized,
    {
        let mut purged = 0;

        for root in self.rules.directories() {
            for directory in expand(self.volume, root) {
                purged += self.purge_directory(&directory, callback);
            }
        }

        info!(purged, "purge finished");
        purged
    }

    fn purge_directory<C>(&self, path: &str, callback: &mut C) -> usize
    where
        C: DecisionCallback<Entry> + ?Sized,
    {
        let mut purged = 0;
        let mut pending = Vec::new();

        for entry in list_or_empty(self.volume, path) {
            match entry.kind {
                EntryKind::File => {
                    let default = self.rules.should_delete_file(&entry);
                    if self.decide(callback, &entry, default) && self.remove(&entry) {
                        purged += 1;
                    }
                }
                EntryKind::Directory => {
                    if self.rules.recursive() {
                        purged += self.purge_directory(&entry.path, callback);
                    }
                    if self.rules.delete_empty_directories() {
                        pending.push(entry);
                    }
                }
            }
        }

        for dir in pending {
            let default = self.is_empty(&dir.path);
            if self.decide(callback, &dir, default) && self.remove(&dir) {
                purged += 1;
            }
        }

        purged
    }

    fn decide<C>(&self, callback: &mut C, entry: &Entry, default: bool) -> bool
    where
        C: DecisionCallback<Entry> + ?Sized,
    {
        let delete = consult(callback, entry, default);
        debug!(path = %entry.path, kind = %entry.kind, default, delete, "decision");
        delete
    }

    /// A directory is empty when no file exists anywhere below it.
    /// Listing failures count as non-empty.
    fn is_empty(&self, path: &str) -> bool {
        match self.volume.list_files(path) {
            Ok(files) => files.is_empty(),
            Err(e) => {
                warn!(path, error = %e, "cannot check directory contents, keeping it");
                false
            }
        }
    }

    fn remove(&self, entry: &Entry) -> bool {
        let result = match entry.kind {
            EntryKind::File => self.volume.delete(&entry.path),
            EntryKind::Directory => self.volume.delete_directory(&entry.path),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %entry.path, error = %e, "delete failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::MemoryVolume;

    const OLD: i64 = 0;

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_only_old_files_go() {
        let volume = MemoryVolume::new()
            .with_file("file_62.txt", now() - 62 * 60)
            .with_file("file_0.txt", now());
        let rules = RuleSet::builder().minutes_old(60).build();

        assert_eq!(PurgeEngine::new(&rules, &volume).purge(), 1);
        assert_eq!(volume.files(), vec!["file_0.txt"]);
    }

    #[test]
    fn test_failed_delete_is_not_counted() {
        let volume = MemoryVolume::new()
            .with_file("a.txt", OLD)
            .with_file("b.txt", OLD)
            .with_file("c.txt", OLD)
            .failing_delete("b.txt");
        let rules = RuleSet::builder().minutes_old(1).build();

        assert_eq!(PurgeEngine::new(&rules, &volume).purge(), 2);
        assert_eq!(volume.files(), vec!["b.txt"]);
    }

    #[test]
    fn test_non_recursive_leaves_subdirectories() {
        let volume = MemoryVolume::new()
            .with_file("top.txt", OLD)
            .with_file("sub/inner.txt", OLD);
        let rules = RuleSet::builder().minutes_old(1).build();

        assert_eq!(PurgeEngine::new(&rules, &volume).purge(), 1);
        assert_eq!(volume.files(), vec!["sub/inner.txt"]);
        assert_eq!(volume.listings(), vec![""]);
    }

    #[test]
    fn test_recursive_with_empty_dirs_is_bottom_up() {
        let volume = MemoryVolume::new()
            .with_file("a/b/c/d/deep.txt", OLD)
            .with_file("a/b/c/mid.txt", OLD)
            .with_file("keep/new.txt", now());
        let rules = RuleSet::builder()
            .minutes_old(1)
            .recursive(true)
            .delete_empty_directories(true)
            .build();

        // 2 files + a, a/b, a/b/c, a/b/c/d
        assert_eq!(PurgeEngine::new(&rules, &volume).purge(), 6);
        assert_eq!(volume.files(), vec!["keep/new.txt"]);
        assert_eq!(volume.dirs(), vec!["keep"]);
    }

    #[test]
    fn test_callback_sees_every_candidate_once() {
        let volume = MemoryVolume::new()
            .with_file("old.txt", OLD)
            .with_file("new.txt", now())
            .with_dir("empty");
        let rules = RuleSet::builder()
            .minutes_old(1)
            .delete_empty_directories(true)
            .build();

        let mut seen = Vec::new();
        let purged = PurgeEngine::new(&rules, &volume).purge_with(&mut |entry: &Entry, default: bool| {
            seen.push((entry.path.clone(), default));
            Decision::Keep
        });

        assert_eq!(purged, 0);
        assert_eq!(
            seen,
            vec![
                ("new.txt".to_string(), false),
                ("old.txt".to_string(), true),
                ("empty".to_string(), true),
            ]
        );
        assert_eq!(volume.files().len(), 2);
        assert!(volume.exists("empty"));
    }

    #[test]
    fn test_callback_can_force_delete() {
        let volume = MemoryVolume::new()
            .with_file("new.txt", now())
            .with_file("full/new.txt", now());
        let rules = RuleSet::builder()
            .minutes_old(1)
            .delete_empty_directories(true)
            .build();

        let purged = PurgeEngine::new(&rules, &volume)
            .purge_with(&mut |_: &Entry, _: bool| Decision::Delete);

        assert_eq!(purged, 2);
        assert!(volume.files().is_empty());
        assert!(volume.dirs().is_empty());
    }

    #[test]
    fn test_multiple_roots_are_summed() {
        let volume = MemoryVolume::new()
            .with_file("directory_1/file.txt", OLD)
            .with_file("directory_2/file.txt", OLD)
            .with_file("directory_3/file.txt", OLD);
        let rules = RuleSet::builder()
            .minutes_old(1)
            .directories(["directory_1", "directory_2"])
            .build();

        assert_eq!(PurgeEngine::new(&rules, &volume).purge(), 2);
        assert_eq!(volume.files(), vec!["directory_3/file.txt"]);
    }
}
