// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::providers::{apply, ApplyState, ProviderContext};
use nexus_adapters::fake::FakeConnection;

fn svc(name: &str, state: ServiceState, enabled: Option<bool>) -> ResourceSpec {
    ResourceSpec::Service {
        name: name.to_string(),
        state,
        enabled,
        notify: None,
    }
}

#[tokio::test]
async fn starts_a_stopped_service() {
    let conn = FakeConnection::new("web1");
    // check sees stopped, enforce re-checks (still stopped), then running.
    conn.on("is-active", "", 3);
    conn.on("is-active", "", 3);
    conn.on("is-active", "", 0);
    conn.on("systemctl start", "", 0);

    let provider = ServiceProvider::new(ServiceManager::Systemd);
    let ctx = ProviderContext::default();
    let spec = svc("nginx", ServiceState::Running, None);

    let first = apply(&provider, &spec, &conn, &ctx).await;
    assert_eq!(first.state, ApplyState::Changed);
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("systemctl start 'nginx'")));

    let second = apply(&provider, &spec, &conn, &ctx).await;
    assert_eq!(second.state, ApplyState::Unchanged);
}

#[tokio::test]
async fn running_service_is_unchanged() {
    let conn = FakeConnection::new("web1");
    conn.on("is-active", "", 0);

    let provider = ServiceProvider::new(ServiceManager::Systemd);
    let result = apply(
        &provider,
        &svc("sshd", ServiceState::Running, None),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Unchanged);
}

#[tokio::test]
async fn stops_a_running_service() {
    let conn = FakeConnection::new("web1");
    conn.on("is-active", "", 0);
    conn.on("systemctl stop", "", 0);

    let provider = ServiceProvider::new(ServiceManager::Systemd);
    let result = apply(
        &provider,
        &svc("telnetd", ServiceState::Stopped, None),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Changed);
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("systemctl stop 'telnetd'")));
}

#[tokio::test]
async fn enable_is_converged_separately_from_running() {
    let conn = FakeConnection::new("web1");
    conn.on("is-active", "", 0);
    conn.on("is-enabled", "", 1);
    conn.on("systemctl enable", "", 0);

    let provider = ServiceProvider::new(ServiceManager::Systemd);
    let result = apply(
        &provider,
        &svc("nginx", ServiceState::Running, Some(true)),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Changed);
    assert_eq!(
        result.diff.unwrap().changes,
        vec!["enable service".to_string()]
    );
    assert!(conn
        .calls()
        .iter()
        .any(|c| c.contains("systemctl enable 'nginx'")));
}

#[tokio::test]
async fn sysvinit_uses_the_service_shim() {
    let conn = FakeConnection::new("alpine1");
    conn.on("status", "", 1);
    conn.on("start", "", 0);

    let provider = ServiceProvider::new(ServiceManager::Sysvinit);
    let result = apply(
        &provider,
        &svc("crond", ServiceState::Running, None),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Changed);
    assert!(conn.calls().iter().any(|c| c.contains("service 'crond' start")));
}

#[tokio::test]
async fn launchd_ignores_enabled() {
    let conn = FakeConnection::new("mac1");
    conn.on("launchctl list", "", 0);

    let provider = ServiceProvider::new(ServiceManager::Launchd);
    let result = apply(
        &provider,
        &svc("com.example.agent", ServiceState::Running, Some(true)),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    // Running already and enabled unsupported: nothing to do.
    assert_eq!(result.state, ApplyState::Unchanged);
}

#[tokio::test]
async fn failed_start_reports_failed() {
    let conn = FakeConnection::new("web1");
    conn.on("is-active", "", 3);
    conn.on("systemctl start", "Job for nginx.service failed", 1);

    let provider = ServiceProvider::new(ServiceManager::Systemd);
    let result = apply(
        &provider,
        &svc("nginx", ServiceState::Running, None),
        &conn,
        &ProviderContext::default(),
    )
    .await;
    assert_eq!(result.state, ApplyState::Failed);
}
