// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::providers::{apply, ApplyState, ProviderContext};
use nexus_adapters::fake::FakeConnection;

fn pkg(name: &str, state: PackageState) -> ResourceSpec {
    ResourceSpec::Package {
        name: name.to_string(),
        version: None,
        state,
        notify: None,
    }
}

#[tokio::test]
async fn installs_missing_package() {
    let conn = FakeConnection::new("web1");
    // Not installed, then installed after apt-get runs.
    conn.on("dpkg-query", "", 1);
    conn.on("dpkg-query", "", 0);
    conn.on("apt-get install", "", 0);

    let provider = PackageProvider::new(PackageManager::Apt);
    let ctx = ProviderContext::default();
    let spec = pkg("nginx", PackageState::Present);

    let first = apply(&provider, &spec, &conn, &ctx).await;
    assert_eq!(first.state, ApplyState::Changed);
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("apt-get install -y 'nginx'")));

    let second = apply(&provider, &spec, &conn, &ctx).await;
    assert_eq!(second.state, ApplyState::Unchanged);
}

#[tokio::test]
async fn installed_package_is_unchanged() {
    let conn = FakeConnection::new("web1");
    conn.on("dpkg-query", "", 0);

    let provider = PackageProvider::new(PackageManager::Apt);
    let result = apply(
        &provider,
        &pkg("nginx", PackageState::Present),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Unchanged);
    assert!(
        !conn.calls().iter().any(|c| c.contains("install")),
        "no mutation for an installed package"
    );
}

#[tokio::test]
async fn latest_upgrades_outdated_package() {
    let conn = FakeConnection::new("web1");
    conn.on("rpm -q", "", 0);
    // First check: outdated; after upgrade: current.
    conn.on("check-update", "", 0);
    conn.on("check-update", "", 1);
    conn.on("dnf upgrade", "", 0);

    let provider = PackageProvider::new(PackageManager::Dnf);
    let ctx = ProviderContext::default();
    let spec = pkg("openssl", PackageState::Latest);

    let first = apply(&provider, &spec, &conn, &ctx).await;
    assert_eq!(first.state, ApplyState::Changed);
    assert_eq!(
        first.diff.unwrap().changes,
        vec!["upgrade package".to_string()]
    );

    let second = apply(&provider, &spec, &conn, &ctx).await;
    assert_eq!(second.state, ApplyState::Unchanged);
}

#[tokio::test]
async fn absent_removes_installed_package() {
    let conn = FakeConnection::new("web1");
    conn.on("pacman -Q ", "", 0);
    conn.on("pacman -R", "", 0);

    let provider = PackageProvider::new(PackageManager::Pacman);
    let result = apply(
        &provider,
        &pkg("vim", PackageState::Absent),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Changed);
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("pacman -R --noconfirm 'vim'")));
}

#[tokio::test]
async fn failed_install_reports_failed() {
    let conn = FakeConnection::new("web1");
    conn.on("apk info", "", 1);
    conn.on("apk add", "ERROR: unsatisfiable constraints", 1);

    let provider = PackageProvider::new(PackageManager::Apk);
    let result = apply(
        &provider,
        &pkg("ghost-pkg", PackageState::Present),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Failed);
    assert!(result.description.contains("unsatisfiable"));
}

#[tokio::test]
async fn version_pins_are_passed_to_the_manager() {
    let conn = FakeConnection::new("web1");
    conn.on("dpkg-query", "", 1);
    conn.on("apt-get install", "", 0);

    let provider = PackageProvider::new(PackageManager::Apt);
    let spec = ResourceSpec::Package {
        name: "nginx".to_string(),
        version: Some("1.24.0-1".to_string()),
        state: PackageState::Present,
        notify: None,
    };
    let result = apply(&provider, &spec, &conn, &ProviderContext::default()).await;
    assert_eq!(result.state, ApplyState::Changed);
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("'nginx=1.24.0-1'")));
}

#[tokio::test]
async fn yum_flavored_manager_for_legacy_rhel() {
    let conn = FakeConnection::new("centos7");
    conn.on("rpm -q", "", 1);
    conn.on("yum install", "", 0);

    let provider = PackageProvider::new(PackageManager::Yum);
    let result = apply(
        &provider,
        &pkg("httpd", PackageState::Present),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Changed);
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("yum install -y 'httpd'")));
}

#[tokio::test]
async fn brew_flow_for_darwin() {
    let conn = FakeConnection::new("mac1");
    conn.on("brew list", "", 1);
    conn.on("brew install", "", 0);

    let provider = PackageProvider::new(PackageManager::Brew);
    let result = apply(
        &provider,
        &pkg("jq", PackageState::Present),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Changed);
    assert!(conn.calls().iter().any(|c| c.contains("brew install 'jq'")));
}
