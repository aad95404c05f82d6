// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}

fn pid(s: &str) -> PipelineId {
    PipelineId::new(s)
}

#[parameterized(
    simple = { "build.tar.gz" },
    underscore = { "my_artifact" },
    dashed = { "release-v1.2" },
    single_dot = { "a.b" },
    numeric = { "0001" },
)]
fn valid_names_pass(name: &str) {
    validate_name(name);
}

#[parameterized(
    empty = { "" },
    slash = { "a/b" },
    backslash = { "a\\b" },
    dotdot = { "..secret" },
    traversal = { "a..b" },
    space = { "a b" },
    tilde = { "~root" },
)]
#[should_panic(expected = "invalid artifact name")]
fn invalid_names_panic(name: &str) {
    validate_name(name);
}

#[test]
#[should_panic(expected = "invalid artifact name")]
fn overlong_name_panics() {
    validate_name(&"a".repeat(256));
}

#[test]
fn name_at_length_limit_passes() {
    validate_name(&"a".repeat(255));
}

#[test]
fn store_then_fetch_round_trips() {
    let (_dir, store) = store();
    let pid = pid("1700000000-aaaa0001");
    store.store(&pid, "bundle", b"bytes here").unwrap();
    assert_eq!(store.fetch(&pid, "bundle").unwrap(), b"bytes here");
    assert!(store.exists(&pid, "bundle"));
}

#[test]
fn fetch_missing_is_not_found() {
    let (_dir, store) = store();
    let pid = pid("1700000000-aaaa0002");
    assert!(matches!(
        store.fetch(&pid, "nothing"),
        Err(StoreError::NotFound(_))
    ));
    assert!(!store.exists(&pid, "nothing"));
}

#[test]
fn store_file_copies_content() {
    let (dir, store) = store();
    let pid = pid("1700000000-aaaa0003");
    let src = dir.path().join("out.bin");
    std::fs::write(&src, b"produced").unwrap();
    store.store_file(&pid, "out.bin", &src).unwrap();
    assert_eq!(store.fetch(&pid, "out.bin").unwrap(), b"produced");
}

#[test]
fn list_is_sorted_and_skips_temp_files() {
    let (_dir, store) = store();
    let pid = pid("1700000000-aaaa0004");
    store.store(&pid, "zeta", b"z").unwrap();
    store.store(&pid, "alpha", b"a").unwrap();
    assert_eq!(store.list(&pid).unwrap(), vec!["alpha", "zeta"]);
}

#[test]
fn list_of_unknown_pipeline_is_empty() {
    let (_dir, store) = store();
    assert!(store.list(&pid("1700000000-ffffffff")).unwrap().is_empty());
}

#[test]
fn cleanup_then_list_is_empty() {
    let (_dir, store) = store();
    let pid = pid("1700000000-aaaa0005");
    store.store(&pid, "x", b"1").unwrap();
    store.cleanup(&pid).unwrap();
    assert!(store.list(&pid).unwrap().is_empty());
    // Cleaning an already-clean pipeline is fine.
    store.cleanup(&pid).unwrap();
}

#[test]
fn overwrite_replaces_content() {
    let (_dir, store) = store();
    let pid = pid("1700000000-aaaa0006");
    store.store(&pid, "x", b"one").unwrap();
    store.store(&pid, "x", b"two").unwrap();
    assert_eq!(store.fetch(&pid, "x").unwrap(), b"two");
}

#[test]
fn cleanup_expired_sweeps_only_old_directories() {
    let (dir, store) = store();
    let old = pid("1600000000-aaaa0007");
    let fresh = pid("1700000000-aaaa0008");
    store.store(&old, "x", b"1").unwrap();
    store.store(&fresh, "y", b"2").unwrap();

    // Age the old directory by backdating its mtime via filetime-free
    // approach: set ttl to zero-but-one so everything older than 0s... a
    // zero TTL would sweep both. Instead backdate with utime through touch.
    let old_dir = dir.path().join("artifacts").join(old.as_str());
    let backdated = std::process::Command::new("touch")
        .arg("-d")
        .arg("2001-01-01T00:00:00")
        .arg(&old_dir)
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    assert!(backdated, "touch -d failed");

    let removed = store.cleanup_expired(Duration::from_secs(24 * 3600)).unwrap();
    assert_eq!(removed, 1);
    assert!(store.list(&old).unwrap().is_empty());
    assert_eq!(store.fetch(&fresh, "y").unwrap(), b"2");
}

#[test]
#[should_panic(expected = "invalid artifact name")]
fn traversal_name_cannot_reach_get_path() {
    let (_dir, store) = store();
    let _ = store.get_path(&pid("1700000000-aaaa0009"), "../../etc/passwd");
}
