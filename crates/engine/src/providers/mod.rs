// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent resource providers
//!
//! Every provider implements `check` (observe), `diff` (compare observed
//! with declared), and `enforce` (converge). The apply protocol lives here
//! once: check -> diff -> unchanged? -> check-mode? -> enforce. That keeps
//! the idempotence invariant (`apply; diff == unchanged`) in one place.
//!
//! Dispatch is a table keyed on `(resource kind, backend)` populated at
//! registry construction. A lookup miss is a configuration bug, not a
//! runtime condition, and panics.

pub mod command;
pub mod directory;
pub mod file;
pub mod group;
pub mod package;
pub mod service;
pub mod user;

use async_trait::async_trait;
use nexus_adapters::{Connection, ExecError, ExecOutput};
use nexus_core::ResourceSpec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Timeout for provider-issued shell probes and mutations.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("apply failed: {0}")]
    ApplyFailed(String),
    #[error("cannot read source file {0}: {1}")]
    Source(String, std::io::Error),
}

/// Observed state of a resource on a host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentState {
    pub exists: bool,
    pub attrs: BTreeMap<String, String>,
}

impl CurrentState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present() -> Self {
        Self {
            exists: true,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }
}

/// What would change (or did change) on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub changed: bool,
    pub before: String,
    pub after: String,
    pub changes: Vec<String>,
}

impl Diff {
    pub fn unchanged(state: impl Into<String>) -> Self {
        let state = state.into();
        Self {
            changed: false,
            before: state.clone(),
            after: state,
            changes: Vec::new(),
        }
    }

    pub fn changed(
        before: impl Into<String>,
        after: impl Into<String>,
        changes: Vec<String>,
    ) -> Self {
        Self {
            changed: true,
            before: before.into(),
            after: after.into(),
            changes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyState {
    Changed,
    Unchanged,
    Failed,
    Skipped,
}

/// Result of applying one resource on one host.
#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub state: ApplyState,
    pub description: String,
    pub diff: Option<Diff>,
    pub duration_ms: u64,
    /// Handler to notify; set only when the apply actually changed the host
    pub notify: Option<String>,
}

/// Per-step execution context for providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderContext {
    pub check_mode: bool,
    pub os_family: String,
    pub sudo: bool,
}

/// Run a shell probe/mutation with the context's privilege level.
pub(crate) async fn sh(
    conn: &dyn Connection,
    ctx: &ProviderContext,
    cmd: &str,
) -> Result<ExecOutput, ProviderError> {
    Ok(conn
        .exec(cmd, &HashMap::new(), PROVIDER_TIMEOUT, ctx.sudo)
        .await?)
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Observe the current state on the host.
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError>;

    /// Compare declared state with the observed one.
    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff;

    /// Converge the host to the declared state.
    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError>;

    fn describe(&self, spec: &ResourceSpec) -> String {
        spec.describe()
    }
}

/// The apply protocol: check, diff, stop when unchanged, report would-change
/// in check mode, otherwise enforce.
pub async fn apply(
    provider: &dyn Provider,
    spec: &ResourceSpec,
    conn: &dyn Connection,
    ctx: &ProviderContext,
) -> ApplyResult {
    let start = Instant::now();
    let description = provider.describe(spec);
    let done = |state, diff, notify| ApplyResult {
        state,
        description: description.clone(),
        diff,
        duration_ms: start.elapsed().as_millis() as u64,
        notify,
    };

    let current = match provider.check(spec, conn, ctx).await {
        Ok(current) => current,
        Err(e) => {
            return ApplyResult {
                state: ApplyState::Failed,
                description: format!("{description}: check failed: {e}"),
                diff: None,
                duration_ms: start.elapsed().as_millis() as u64,
                notify: None,
            }
        }
    };

    let diff = provider.diff(spec, &current);
    if !diff.changed {
        return done(ApplyState::Unchanged, Some(diff), None);
    }
    if ctx.check_mode {
        return done(ApplyState::Skipped, Some(diff), None);
    }

    match provider.enforce(spec, conn, ctx).await {
        Ok(()) => {
            let notify = spec.notify().map(str::to_string);
            done(ApplyState::Changed, Some(diff), notify)
        }
        Err(e) => ApplyResult {
            state: ApplyState::Failed,
            description: format!("{description}: {e}"),
            diff: Some(diff),
            duration_ms: start.elapsed().as_millis() as u64,
            notify: None,
        },
    }
}

/// Dispatch table `(kind, backend) -> provider`. Backend is the host's
/// os_family; `"*"` entries are the fallback for kinds that behave the same
/// everywhere POSIX.
pub struct ProviderRegistry {
    table: HashMap<(String, String), Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// The built-in provider set.
    pub fn standard() -> Self {
        use package::PackageManager;
        use service::ServiceManager;

        let mut registry = Self::empty();

        registry.register("file", "*", Arc::new(file::FileProvider));
        registry.register("directory", "*", Arc::new(directory::DirectoryProvider));
        registry.register("command", "*", Arc::new(command::CommandProvider));

        registry.register("user", "*", Arc::new(user::UserProvider::linux()));
        registry.register("user", "darwin", Arc::new(user::UserProvider::darwin()));
        registry.register("group", "*", Arc::new(group::GroupProvider::linux()));
        registry.register("group", "darwin", Arc::new(group::GroupProvider::darwin()));

        registry.register(
            "package",
            "debian",
            Arc::new(package::PackageProvider::new(PackageManager::Apt)),
        );
        registry.register(
            "package",
            "rhel",
            Arc::new(package::PackageProvider::new(PackageManager::Dnf)),
        );
        registry.register(
            "package",
            "arch",
            Arc::new(package::PackageProvider::new(PackageManager::Pacman)),
        );
        registry.register(
            "package",
            "alpine",
            Arc::new(package::PackageProvider::new(PackageManager::Apk)),
        );
        registry.register(
            "package",
            "darwin",
            Arc::new(package::PackageProvider::new(PackageManager::Brew)),
        );

        registry.register(
            "service",
            "*",
            Arc::new(service::ServiceProvider::new(ServiceManager::Systemd)),
        );
        registry.register(
            "service",
            "darwin",
            Arc::new(service::ServiceProvider::new(ServiceManager::Launchd)),
        );
        registry.register(
            "service",
            "alpine",
            Arc::new(service::ServiceProvider::new(ServiceManager::Sysvinit)),
        );

        registry
    }

    pub fn register(
        &mut self,
        kind: impl Into<String>,
        backend: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) {
        self.table.insert((kind.into(), backend.into()), provider);
    }

    /// Exact `(kind, os_family)` match, then the `(kind, "*")` fallback.
    ///
    /// A miss means a resource kind reached a host family nobody registered
    /// a provider for; that is a registry construction bug.
    #[allow(clippy::panic)]
    pub fn lookup(&self, kind: &str, os_family: &str) -> Arc<dyn Provider> {
        self.table
            .get(&(kind.to_string(), os_family.to_string()))
            .or_else(|| self.table.get(&(kind.to_string(), "*".to_string())))
            .cloned()
            .unwrap_or_else(|| {
                panic!("no provider registered for kind={kind} os_family={os_family}")
            })
    }

    pub fn has(&self, kind: &str, os_family: &str) -> bool {
        self.table
            .contains_key(&(kind.to_string(), os_family.to_string()))
            || self.table.contains_key(&(kind.to_string(), "*".to_string()))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
