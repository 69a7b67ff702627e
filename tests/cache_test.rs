use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use filepurge::purge::Decision;
use filepurge::CacheExpiryEngine;

/// Write a cache entry the way a file cache store does: a ten digit
/// expiration timestamp followed by the serialized value.
fn make_cache_file(root: &Path, key: &str, expires_at: i64) -> PathBuf {
    let path = root.join(&key[..2]).join(&key[2..4]).join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, format!("{:010}s:5:\"value\";", expires_at)).unwrap();
    path
}

fn now() -> i64 {
    Utc::now().timestamp()
}

#[test]
fn test_unexpired_cache_is_untouched() {
    let tmp = TempDir::new().unwrap();
    let a = make_cache_file(tmp.path(), "aabbccdd01", now() + 3600);
    let b = make_cache_file(tmp.path(), "aabbccdd02", now() + 60);

    let purged = CacheExpiryEngine::new(tmp.path()).purge();

    assert_eq!(purged, 0);
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_expired_cache_is_removed() {
    let tmp = TempDir::new().unwrap();
    let expired = make_cache_file(tmp.path(), "aabbccdd01", now() - 3600);
    let also_expired = make_cache_file(tmp.path(), "ffeeddcc01", now() - 1);
    let fresh = make_cache_file(tmp.path(), "ffeeddcc02", now() + 3600);

    let purged = CacheExpiryEngine::new(tmp.path()).purge();

    assert_eq!(purged, 2);
    assert!(!expired.exists());
    assert!(!also_expired.exists());
    assert!(fresh.exists());
}

#[test]
fn test_expiring_exactly_now_counts_as_expired() {
    let tmp = TempDir::new().unwrap();
    let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let boundary = make_cache_file(tmp.path(), "aabbccdd01", at.timestamp());
    let later = make_cache_file(tmp.path(), "aabbccdd02", at.timestamp() + 1);

    let purged = CacheExpiryEngine::new(tmp.path()).at(at).purge();

    assert_eq!(purged, 1);
    assert!(!boundary.exists());
    assert!(later.exists());
}

#[test]
fn test_respects_callback_response() {
    let tmp = TempDir::new().unwrap();
    let expired = make_cache_file(tmp.path(), "aabbccdd01", now() - 3600);
    let fresh = make_cache_file(tmp.path(), "aabbccdd02", now() + 3600);

    let mut seen = Vec::new();
    let purged = CacheExpiryEngine::new(tmp.path()).purge_with(&mut |path: &Path, expired: bool| {
        seen.push((path.to_path_buf(), expired));
        Decision::Keep
    });
    assert_eq!(purged, 0);
    seen.sort();
    assert_eq!(seen, vec![(expired.clone(), true), (fresh.clone(), false)]);

    let purged = CacheExpiryEngine::new(tmp.path())
        .purge_with(&mut |_: &Path, _: bool| Decision::Delete);
    assert_eq!(purged, 2);
    assert!(!expired.exists());
    assert!(!fresh.exists());
}

#[test]
fn test_files_without_timestamp_header_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let garbage = tmp.path().join("not-a-cache-file");
    std::fs::write(&garbage, "hello world, not a timestamp").unwrap();
    let short = tmp.path().join("short");
    std::fs::write(&short, "ok").unwrap();
    let expired = make_cache_file(tmp.path(), "aabbccdd01", now() - 10);

    let mut calls = 0;
    let purged = CacheExpiryEngine::new(tmp.path()).purge_with(&mut |_: &Path, _: bool| {
        calls += 1;
        Decision::Delete
    });

    assert_eq!(calls, 1);
    assert_eq!(purged, 1);
    assert!(garbage.exists());
    assert!(short.exists());
    assert!(!expired.exists());
}

#[test]
fn test_missing_cache_directory_purges_nothing() {
    let tmp = TempDir::new().unwrap();
    let engine = CacheExpiryEngine::new(tmp.path().join("no-such-cache"));
    assert_eq!(engine.purge(), 0);
}
