// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use nexus_adapters::fake::FakeConnection;
use nexus_core::{DesiredState, ResourceSpec};

fn file_spec(notify: Option<&str>) -> ResourceSpec {
    ResourceSpec::File {
        path: "/etc/motd".into(),
        content: Some("hello".to_string()),
        source: None,
        owner: None,
        group: None,
        mode: None,
        state: DesiredState::Present,
        notify: notify.map(str::to_string),
    }
}

#[test]
fn standard_registry_covers_the_dispatch_table() {
    let registry = ProviderRegistry::standard();
    for kind in ["file", "directory", "command", "user", "group"] {
        for family in ["debian", "rhel", "arch", "alpine", "darwin", "unknown"] {
            assert!(registry.has(kind, family), "missing {kind}/{family}");
        }
    }
    for family in ["debian", "rhel", "arch", "alpine", "darwin"] {
        assert!(registry.has("package", family), "missing package/{family}");
        assert!(registry.has("service", family), "missing service/{family}");
    }
}

#[test]
#[should_panic(expected = "no provider registered")]
fn lookup_miss_panics() {
    let registry = ProviderRegistry::empty();
    let _ = registry.lookup("package", "debian");
}

#[test]
fn exact_backend_wins_over_fallback() {
    let registry = ProviderRegistry::standard();
    // darwin service resolves to launchd, not the systemd fallback; this
    // shows indirectly through has() plus a lookup that must not panic.
    let _ = registry.lookup("service", "darwin");
    let _ = registry.lookup("service", "gentoo");
}

#[tokio::test]
async fn apply_is_unchanged_when_state_matches() {
    let conn = FakeConnection::new("h");
    conn.seed_file("/etc/motd", b"hello".to_vec());
    let registry = ProviderRegistry::standard();
    let provider = registry.lookup("file", "debian");
    let ctx = ProviderContext::default();

    let result = apply(provider.as_ref(), &file_spec(None), &conn, &ctx).await;
    assert_eq!(result.state, ApplyState::Unchanged);
    assert!(!result.diff.unwrap().changed);
    assert!(result.notify.is_none());
}

#[tokio::test]
async fn apply_changes_and_notifies() {
    let conn = FakeConnection::new("h");
    let registry = ProviderRegistry::standard();
    let provider = registry.lookup("file", "debian");
    let ctx = ProviderContext::default();

    let result = apply(provider.as_ref(), &file_spec(Some("reload")), &conn, &ctx).await;
    assert_eq!(result.state, ApplyState::Changed);
    assert_eq!(result.notify.as_deref(), Some("reload"));
    assert_eq!(
        conn.file(std::path::Path::new("/etc/motd")).unwrap(),
        b"hello"
    );
}

#[tokio::test]
async fn check_mode_skips_but_reports_would_change() {
    let conn = FakeConnection::new("h");
    let registry = ProviderRegistry::standard();
    let provider = registry.lookup("file", "debian");
    let ctx = ProviderContext {
        check_mode: true,
        ..ProviderContext::default()
    };

    let result = apply(provider.as_ref(), &file_spec(Some("reload")), &conn, &ctx).await;
    assert_eq!(result.state, ApplyState::Skipped);
    assert!(result.diff.unwrap().changed);
    assert!(result.notify.is_none(), "check mode must not notify");
    assert!(
        conn.file(std::path::Path::new("/etc/motd")).is_none(),
        "check mode must not write"
    );
}

#[tokio::test]
async fn apply_then_diff_is_unchanged() {
    // Invariant: check -> diff -> apply -> check -> diff ends unchanged.
    let conn = FakeConnection::new("h");
    let registry = ProviderRegistry::standard();
    let provider = registry.lookup("file", "debian");
    let ctx = ProviderContext::default();
    let spec = file_spec(None);

    let first = apply(provider.as_ref(), &spec, &conn, &ctx).await;
    assert_eq!(first.state, ApplyState::Changed);

    let second = apply(provider.as_ref(), &spec, &conn, &ctx).await;
    assert_eq!(second.state, ApplyState::Unchanged);
    assert!(!second.diff.unwrap().changed);
}
