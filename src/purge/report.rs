use serde::Serialize;

use crate::volume::Entry;

/// Record of one purge run, as printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    /// Rule set name or cache directory
    pub target: String,
    pub dry_run: bool,
    pub purged: usize,
    pub candidates: Vec<CandidateRecord>,
    pub duration_secs: f64,
}

/// One candidate seen by the decision callback
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub path: String,
    /// `file`, `dir` or `cache`
    pub kind: String,
    /// Decision computed by the rules, before any override
    pub deleting: bool,
}

impl PurgeReport {
    pub fn new(target: impl Into<String>, dry_run: bool) -> Self {
        Self {
            target: target.into(),
            dry_run,
            purged: 0,
            candidates: Vec::new(),
            duration_secs: 0.0,
        }
    }

    pub fn record_entry(&mut self, entry: &Entry, deleting: bool) {
        self.candidates.push(CandidateRecord {
            path: entry.path.clone(),
            kind: entry.kind.to_string(),
            deleting,
        });
    }

    pub fn record_cache_file(&mut self, path: &std::path::Path, expired: bool) {
        self.candidates.push(CandidateRecord {
            path: path.display().to_string(),
            kind: "cache".to_string(),
            deleting: expired,
        });
    }

    /// Candidates the rules wanted gone
    pub fn deleting_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.deleting).count()
    }
}
