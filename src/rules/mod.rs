//! Purge rules: which directories to visit and which files qualify.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

use crate::volume::Entry;

/// Immutable purge configuration.
///
/// Built with [`RuleSet::builder`]; extension lists are stored normalized
/// (see [`normalize_extension`]).
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    directories: Vec<String>,
    recursive: bool,
    delete_empty_directories: bool,
    extension_allow: Option<BTreeSet<String>>,
    extension_deny: Option<BTreeSet<String>>,
    older_than: DateTime<Utc>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Directory roots, each possibly holding `*` wildcard segments
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn delete_empty_directories(&self) -> bool {
        self.delete_empty_directories
    }

    pub fn extension_allow(&self) -> Option<&BTreeSet<String>> {
        self.extension_allow.as_ref()
    }

    pub fn extension_deny(&self) -> Option<&BTreeSet<String>> {
        self.extension_deny.as_ref()
    }

    /// Files modified after this instant are always kept
    pub fn older_than(&self) -> DateTime<Utc> {
        self.older_than
    }

    /// Default deletion decision for a file. First matching rule wins:
    /// too new, deny-listed, not allow-listed, otherwise delete.
    pub fn should_delete_file(&self, entry: &Entry) -> bool {
        if entry.mtime > self.older_than.timestamp() {
            return false;
        }

        let basename = entry.basename.to_lowercase();

        if let Some(deny) = &self.extension_deny {
            if deny.iter().any(|ext| basename.ends_with(ext.as_str())) {
                return false;
            }
        }

        if let Some(allow) = &self.extension_allow {
            if !allow.iter().any(|ext| basename.ends_with(ext.as_str())) {
                return false;
            }
        }

        true
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSetBuilder::default().build()
    }
}

/// Builder for [`RuleSet`]
#[derive(Debug, Clone)]
pub struct RuleSetBuilder {
    directories: Vec<String>,
    recursive: bool,
    delete_empty_directories: bool,
    extension_allow: Option<BTreeSet<String>>,
    extension_deny: Option<BTreeSet<String>>,
    older_than: Option<DateTime<Utc>>,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self {
            directories: vec![String::new()],
            recursive: false,
            delete_empty_directories: false,
            extension_allow: None,
            extension_deny: None,
            older_than: None,
        }
    }
}

impl RuleSetBuilder {
    /// Replace the roots with a single directory
    pub fn directory(self, path: impl Into<String>) -> Self {
        self.directories([path.into()])
    }

    /// Replace the roots. An empty list falls back to the volume root.
    pub fn directories<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directories = paths.into_iter().map(Into::into).collect();
        if self.directories.is_empty() {
            self.directories.push(String::new());
        }
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn delete_empty_directories(mut self, enabled: bool) -> Self {
        self.delete_empty_directories = enabled;
        self
    }

    /// Only files ending with one of these extensions are deleted
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extension_allow = normalize_extensions(extensions);
        self
    }

    /// Files ending with one of these extensions are never deleted
    pub fn extensions_blacklist<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extension_deny = normalize_extensions(extensions);
        self
    }

    /// Keep files modified within the last `minutes`
    pub fn minutes_old(mut self, minutes: u64) -> Self {
        let minutes = i64::try_from(minutes).unwrap_or(i64::MAX);
        let cutoff = Duration::try_minutes(minutes)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.older_than = Some(cutoff);
        self
    }

    /// Keep files modified after `cutoff`
    pub fn older_than(mut self, cutoff: DateTime<Utc>) -> Self {
        self.older_than = Some(cutoff);
        self
    }

    /// Finish the rule set. Without an age rule the cutoff is "now".
    pub fn build(self) -> RuleSet {
        RuleSet {
            directories: self.directories,
            recursive: self.recursive,
            delete_empty_directories: self.delete_empty_directories,
            extension_allow: self.extension_allow,
            extension_deny: self.extension_deny,
            older_than: self.older_than.unwrap_or_else(Utc::now),
        }
    }
}

/// Normalize an extension: no leading dots, trimmed, lower-cased, then a
/// single dot prefix. Internal dots (`.tar.gz`) are kept.
pub fn normalize_extension(extension: &str) -> String {
    let bare = extension
        .trim_start_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_end();
    format!(".{}", bare.to_lowercase())
}

/// Split a comma-separated extension list (`"jpg, .PNG"`).
pub fn parse_extension_list(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

fn normalize_extensions<I, S>(extensions: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = extensions
        .into_iter()
        .map(|ext| normalize_extension(ext.as_ref()))
        .filter(|ext| ext.len() > 1)
        .collect();

    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}
