//! Expiry of file-based key-value caches.
//!
//! Cache files carry their own expiration instant in a header, so the
//! filesystem modification time plays no part here.

pub mod header;

pub use header::{ExpirationReader, LeadingTimestamp};

use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::purge::callback::consult;
use crate::purge::{DecisionCallback, UseDefaults};

/// Deletes cache files whose embedded expiration has passed.
#[derive(Debug, Clone)]
pub struct CacheExpiryEngine<R = LeadingTimestamp> {
    root: PathBuf,
    reader: R,
    now: Option<DateTime<Utc>>,
}

impl CacheExpiryEngine<LeadingTimestamp> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_reader(root, LeadingTimestamp)
    }
}

impl<R: ExpirationReader> CacheExpiryEngine<R> {
    pub fn with_reader(root: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            root: root.into(),
            reader,
            now: None,
        }
    }

    /// Evaluate expiry against a fixed instant instead of the clock
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn purge(&self) -> usize {
        self.purge_with(&mut UseDefaults)
    }

    /// Walk the cache tree and delete expired entries, consulting
    /// `callback` with `(path, expired)` for every file that has a
    /// readable expiration header. Returns the number of files deleted.
    pub fn purge_with<C>(&self, callback: &mut C) -> usize
    where
        C: DecisionCallback<Path> + ?Sized,
    {
        if !self.root.is_dir() {
            debug!(root = %self.root.display(), "cache directory does not exist");
            return 0;
        }

        let now = self.now.unwrap_or_else(Utc::now).timestamp();
        let mut purged = 0;

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "cannot read cache entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(expires_at) = self.expiration_of(path) else {
                continue;
            };

            let expired = now >= expires_at;
            let delete = consult(callback, path, expired);
            debug!(path = %path.display(), expires_at, expired, delete, "cache decision");

            if delete {
                match std::fs::remove_file(path) {
                    Ok(()) => purged += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "cache delete failed"),
                }
            }
        }

        info!(purged, root = %self.root.display(), "cache purge finished");
        purged
    }

    fn expiration_of(&self, path: &Path) -> Option<i64> {
        let file = std::fs::File::open(path).ok()?;
        let mut header = Vec::with_capacity(self.reader.header_len());
        file.take(self.reader.header_len() as u64)
            .read_to_end(&mut header)
            .ok()?;
        self.reader.parse_expiration(&header)
    }
}
