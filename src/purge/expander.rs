use tracing::warn;

use crate::volume::{normalize_path, Entry, StorageVolume};

/// Path segment matching any immediate subdirectory
pub const WILDCARD: &str = "*";

/// Resolve a directory root into the concrete directories it denotes.
///
/// A root without wildcard segments resolves to itself, existing or not.
/// Otherwise the text before the first `*` segment is listed and every
/// subdirectory found there replaces the wildcard; the rest of the pattern
/// is then expanded again, so later wildcards fan out one level at a time.
/// Paths produced from a wildcard are only returned if they exist.
/// Results follow the volume's listing order.
pub fn expand<V: StorageVolume + ?Sized>(volume: &V, root: &str) -> Vec<String> {
    match split_at_wildcard(root) {
        Some((prefix, suffix)) => expand_below(volume, prefix, suffix),
        None => vec![root.to_string()],
    }
}

fn expand_below<V: StorageVolume + ?Sized>(volume: &V, prefix: &str, suffix: &str) -> Vec<String> {
    list_or_empty(volume, prefix)
        .into_iter()
        .filter(Entry::is_dir)
        .flat_map(|dir| {
            // Only the pattern is scanned again, never the listed name
            if let Some((between, rest)) = split_at_wildcard(suffix) {
                let prefix = format!("{}{}", dir.path, between);
                return expand_below(volume, &prefix, rest);
            }
            let candidate = format!("{}{}", dir.path, suffix);
            if normalize_path(suffix).is_empty() || is_existing_dir(volume, &candidate) {
                vec![candidate]
            } else {
                Vec::new()
            }
        })
        .collect()
}

fn is_existing_dir<V: StorageVolume + ?Sized>(volume: &V, path: &str) -> bool {
    let path = normalize_path(path);
    let parent = path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("");
    list_or_empty(volume, parent)
        .iter()
        .any(|entry| entry.is_dir() && entry.path == path)
}

/// Split around the first wildcard segment: the prefix excludes the
/// separator before `*`, the suffix keeps the separator after it.
pub fn split_at_wildcard(root: &str) -> Option<(&str, &str)> {
    let mut offset = 0usize;
    for segment in root.split('/') {
        if segment == WILDCARD {
            let prefix = &root[..offset.saturating_sub(1)];
            let suffix = &root[offset + segment.len()..];
            return Some((prefix, suffix));
        }
        offset += segment.len() + 1;
    }
    None
}

/// List a directory, treating failures like a missing directory.
pub(crate) fn list_or_empty<V: StorageVolume + ?Sized>(volume: &V, path: &str) -> Vec<Entry> {
    match volume.list(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path, error = %e, "listing failed, skipping directory");
            Vec::new()
        }
    }
}
