// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline runner
//!
//! Drives the selected sub-DAG phase by phase. Tasks inside a phase run
//! concurrently under a counting semaphore; a permit is held for a task's
//! whole duration across all of its hosts. Phase boundaries are barriers:
//! nothing from phase N+1 starts until all of phase N has finished.

use crate::dag::Graph;
use crate::error::RunError;
use crate::facts_cache::FactsCache;
use crate::interpreter::{Interpreter, StepEnv};
use crate::providers::ProviderRegistry;
use crate::telemetry::TelemetryBus;
use indexmap::IndexMap;
use nexus_adapters::cancel::CancelToken;
use nexus_adapters::ssh::pool::{Pool, PoolError, PooledConn, SshConnector, DEFAULT_POOL_SIZE};
use nexus_adapters::{ChunkFn, ConnectOptions, Connection, LocalConnection};
use nexus_config::{Config, ResolvedTarget};
use nexus_core::{
    CommandResult, ConnectionKind, Event, Host, HostResult, HostStatus, PipelineId,
    PipelineResult, RunStatus, StepAction, Strategy, Task, TaskResult, TaskStatus,
};
use nexus_store::ArtifactStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Artifact directories older than this are swept at the start of a run.
const ARTIFACT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Fallback per-step estimate for transfer-like steps, used only for the
/// pipeline-global timeout budget.
const STEP_ESTIMATE: Duration = Duration::from_secs(300);

/// Options for one `run` invocation.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Providers check+diff but never apply; shell steps are skipped
    pub check_mode: bool,
    /// Keep only tasks whose tags intersect (empty = keep all)
    pub tags: Vec<String>,
    /// Drop tasks whose tags intersect
    pub skip_tags: Vec<String>,
    /// Concurrent task bound; a permit spans a task's whole duration
    pub parallel_limit: usize,
    pub continue_on_error: bool,
    pub ssh: ConnectOptions,
    /// Live output callback for shell steps
    pub output: Option<ChunkFn>,
    /// Override for `<data_dir>`; defaults to config, then `~/.nexus`
    pub data_dir: Option<PathBuf>,
    /// Pipeline cancel token; a fresh one is created when absent
    pub cancel: Option<Arc<CancelToken>>,
    /// Pipeline-global timeout override
    pub timeout: Option<Duration>,
}

impl RunOptions {
    fn parallel_limit(&self) -> usize {
        if self.parallel_limit == 0 {
            10
        } else {
            self.parallel_limit
        }
    }
}

/// What `dry_run` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub total_tasks: usize,
    pub phases: Vec<Vec<String>>,
}

/// Hands out connections per host: a shared-nothing local connection, or a
/// checkout from that host's bounded SSH pool.
struct ConnectionManager {
    opts: ConnectOptions,
    cancel: Arc<CancelToken>,
    pools: Mutex<HashMap<String, Arc<Pool<SshConnector>>>>,
}

enum Lease {
    Local(LocalConnection),
    Ssh(PooledConn<SshConnector>),
}

impl Lease {
    fn conn(&self) -> &dyn Connection {
        match self {
            Lease::Local(conn) => conn,
            Lease::Ssh(pooled) => &**pooled,
        }
    }
}

impl ConnectionManager {
    fn new(mut opts: ConnectOptions, cancel: Arc<CancelToken>) -> Self {
        opts.cancel = Some(Arc::clone(&cancel));
        Self {
            opts,
            cancel,
            pools: Mutex::new(HashMap::new()),
        }
    }

    async fn lease(&self, host: &Host) -> Result<Lease, PoolError> {
        match host.connection {
            ConnectionKind::Local => Ok(Lease::Local(
                LocalConnection::named(&host.name).with_cancel(Arc::clone(&self.cancel)),
            )),
            ConnectionKind::Ssh => {
                let pool = {
                    let mut pools = self.pools.lock();
                    Arc::clone(pools.entry(host.name.clone()).or_insert_with(|| {
                        Pool::new(
                            SshConnector {
                                host: host.clone(),
                                opts: self.opts.clone(),
                            },
                            DEFAULT_POOL_SIZE,
                        )
                    }))
                };
                pool.acquire().await.map(Lease::Ssh)
            }
        }
    }

    async fn shutdown(&self) {
        let pools: Vec<Arc<Pool<SshConnector>>> =
            self.pools.lock().drain().map(|(_, pool)| pool).collect();
        for pool in pools {
            pool.shutdown().await;
        }
    }
}

/// Everything a spawned task future needs, cloneable per task.
#[derive(Clone)]
struct TaskCtx {
    pipeline_id: PipelineId,
    interp: Arc<Interpreter>,
    bus: Arc<TelemetryBus>,
    cache: Arc<FactsCache>,
    conns: Arc<ConnectionManager>,
    store: ArtifactStore,
    artifacts_dir: PathBuf,
    check_mode: bool,
    continue_on_error: bool,
    output: Option<ChunkFn>,
    cancel: Arc<CancelToken>,
}

pub struct Runner {
    bus: Arc<TelemetryBus>,
    registry: Arc<ProviderRegistry>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            bus: Arc::new(TelemetryBus::new()),
            registry: Arc::new(ProviderRegistry::standard()),
        }
    }

    pub fn with_bus(bus: Arc<TelemetryBus>) -> Self {
        Self {
            bus,
            registry: Arc::new(ProviderRegistry::standard()),
        }
    }

    /// The bus sinks attach to (CLI progress, dashboards, webhooks).
    pub fn bus(&self) -> Arc<TelemetryBus> {
        Arc::clone(&self.bus)
    }

    /// Select requested tasks plus transitive deps, then apply tag filters.
    fn selected_graph(
        config: &Config,
        requested: &[String],
        tags: &[String],
        skip_tags: &[String],
    ) -> Result<Graph, RunError> {
        let graph = Graph::build(config.tasks.values())?;
        let graph = if requested.is_empty() {
            graph
        } else {
            graph.select_with_deps(requested)?
        };

        if tags.is_empty() && skip_tags.is_empty() {
            return Ok(graph);
        }

        let keep = |task: &Task| -> bool {
            if task.tags.iter().any(|t| skip_tags.contains(t)) {
                return false;
            }
            tags.is_empty() || task.tags.iter().any(|t| tags.contains(t))
        };
        let kept: HashSet<&str> = graph
            .nodes()
            .into_iter()
            .filter(|name| config.tasks.get(*name).map(keep).unwrap_or(false))
            .collect();
        // Rebuild with edges restricted to surviving tasks. A dropped task
        // does not drag its dependents down; tags are an operator override.
        let filtered: Vec<Task> = graph
            .nodes()
            .into_iter()
            .filter(|name| kept.contains(name))
            .filter_map(|name| config.tasks.get(name).cloned())
            .map(|mut task| {
                task.deps.retain(|dep| kept.contains(dep.as_str()));
                task
            })
            .collect();
        Ok(Graph::build(filtered.iter())?)
    }

    /// Plan without executing.
    pub fn dry_run(&self, config: &Config, requested: &[String]) -> Result<Plan, RunError> {
        let graph = Self::selected_graph(config, requested, &[], &[])?;
        Ok(Plan {
            total_tasks: graph.len(),
            phases: graph.execution_phases(),
        })
    }

    /// Rough upper bound for the whole pipeline, used as the default
    /// global timeout: per-phase max task estimate, summed, plus 10%.
    fn global_timeout(config: &Config, phases: &[Vec<String>]) -> Duration {
        let task_estimate = |name: &str| -> Duration {
            let Some(task) = config.tasks.get(name) else {
                return STEP_ESTIMATE;
            };
            let steps: Duration = task
                .steps
                .iter()
                .map(|step| match &step.action {
                    StepAction::Shell { timeout_secs, .. } => Duration::from_secs(*timeout_secs),
                    StepAction::WaitFor(spec) => Duration::from_millis(spec.timeout_ms),
                    _ => STEP_ESTIMATE,
                })
                .sum();
            match task.strategy {
                // Sequential/rolling hosts serialize; without resolving
                // hosts here, budget a generous multiplier.
                Strategy::Sequential | Strategy::Rolling => steps * 8,
                Strategy::Parallel => steps,
            }
        };
        let total: Duration = phases
            .iter()
            .map(|phase| {
                phase
                    .iter()
                    .map(|name| task_estimate(name))
                    .max()
                    .unwrap_or_default()
            })
            .sum();
        total + total / 10
    }

    /// Execute the requested tasks (all tasks when `requested` is empty).
    pub async fn run(
        &self,
        config: &Config,
        requested: &[String],
        opts: RunOptions,
    ) -> Result<PipelineResult, RunError> {
        let started = Instant::now();
        let pipeline_id = PipelineId::generate();
        let cancel = opts.cancel.clone().unwrap_or_else(CancelToken::new);

        let data_dir = opts
            .data_dir
            .clone()
            .or_else(|| config.data_dir.clone())
            .or_else(|| dirs::home_dir().map(|home| home.join(".nexus")))
            .unwrap_or_else(|| PathBuf::from(".nexus"));
        let store = ArtifactStore::new(&data_dir);
        if let Err(e) = store.cleanup_expired(ARTIFACT_TTL) {
            tracing::warn!(error = %e, "artifact TTL sweep failed");
        }
        store.init(&pipeline_id)?;
        let artifacts_dir = store.pipeline_dir(&pipeline_id);

        let graph = Self::selected_graph(config, requested, &opts.tags, &opts.skip_tags)?;
        let phases = graph.execution_phases();
        let selected: Vec<String> = graph.nodes().iter().map(|s| s.to_string()).collect();

        tracing::info!(
            %pipeline_id,
            tasks = selected.len(),
            phases = phases.len(),
            check_mode = opts.check_mode,
            "pipeline starting"
        );
        self.bus.emit(&Event::PipelineStart {
            pipeline_id: pipeline_id.clone(),
            tasks: selected.clone(),
        });

        let ctx = TaskCtx {
            pipeline_id: pipeline_id.clone(),
            interp: Arc::new(Interpreter::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.bus),
            )),
            bus: Arc::clone(&self.bus),
            cache: Arc::new(FactsCache::new()),
            conns: Arc::new(ConnectionManager::new(opts.ssh.clone(), Arc::clone(&cancel))),
            store: store.clone(),
            artifacts_dir,
            check_mode: opts.check_mode,
            continue_on_error: opts.continue_on_error,
            output: opts.output.clone(),
            cancel: Arc::clone(&cancel),
        };

        // Watchdog enforcing the global budget by firing the cancel token.
        // Floor of a minute so a trivially small estimate cannot cancel a
        // healthy run.
        let global_timeout = opts
            .timeout
            .unwrap_or_else(|| Self::global_timeout(config, &phases).max(Duration::from_secs(60)));
        let watchdog = {
            let cancel = Arc::clone(&cancel);
            let pipeline_id = pipeline_id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(global_timeout).await;
                tracing::error!(%pipeline_id, ?global_timeout, "pipeline timed out; cancelling");
                cancel.cancel();
            })
        };

        let semaphore = Arc::new(Semaphore::new(opts.parallel_limit()));
        let mut results: IndexMap<String, TaskResult> = IndexMap::new();
        let mut notified: Vec<String> = Vec::new();
        // Failed tasks plus everything skipped because of them.
        let mut poisoned: HashSet<String> = HashSet::new();
        let mut aborted_at: Option<String> = None;
        let mut aborted = false;

        for phase in &phases {
            if cancel.is_cancelled() || (aborted && !opts.continue_on_error) {
                break;
            }

            let mut join: JoinSet<(String, TaskResult, Vec<String>)> = JoinSet::new();
            for name in phase {
                // Dependents of failed tasks never run.
                if graph
                    .dependencies(name)
                    .iter()
                    .any(|dep| poisoned.contains(dep))
                {
                    poisoned.insert(name.clone());
                    results.insert(
                        name.clone(),
                        TaskResult::skipped(name.clone(), TaskStatus::SkippedDependency),
                    );
                    continue;
                }
                let Some(task) = config.tasks.get(name) else {
                    return Err(RunError::Internal(format!("task {name} vanished")));
                };
                let hosts = resolve_hosts(config, task)?;
                let ctx = ctx.clone();
                let task = task.clone();
                let name = name.clone();
                let semaphore = Arc::clone(&semaphore);
                join.spawn(async move {
                    // A permit spans the whole task across all its hosts.
                    let _permit = semaphore.acquire_owned().await.ok();
                    let (result, notified) = run_task(&ctx, &task, hosts).await;
                    (name, result, notified)
                });
            }

            let mut finished: HashMap<String, (TaskResult, Vec<String>)> = HashMap::new();
            while let Some(joined) = join.join_next().await {
                match joined {
                    Ok((name, result, task_notified)) => {
                        finished.insert(name, (result, task_notified));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "task future panicked");
                        aborted = true;
                    }
                }
            }

            // Fold results back in phase (declaration) order.
            for name in phase {
                let Some((result, task_notified)) = finished.remove(name) else {
                    continue;
                };
                if result.status == TaskStatus::Failed {
                    poisoned.insert(name.clone());
                    if !opts.continue_on_error && aborted_at.is_none() {
                        aborted_at = Some(name.clone());
                    }
                    aborted = true;
                }
                notified.extend(task_notified);
                results.insert(name.clone(), result);
            }
        }

        // Anything not reached: dependency-skip if poisoned upstream,
        // otherwise not-run.
        for name in graph.nodes() {
            if results.contains_key(name) {
                continue;
            }
            let status = if graph
                .dependencies(name)
                .iter()
                .any(|dep| poisoned.contains(dep))
            {
                TaskStatus::SkippedDependency
            } else {
                TaskStatus::NotRun
            };
            results.insert(name.to_string(), TaskResult::skipped(name, status));
        }

        if cancel.is_cancelled() && aborted_at.is_none() {
            aborted_at = results
                .values()
                .find(|r| r.status == TaskStatus::Failed)
                .map(|r| r.task.clone())
                .or_else(|| {
                    results
                        .values()
                        .find(|r| r.status == TaskStatus::NotRun)
                        .map(|r| r.task.clone())
                });
        }

        // Notified handlers run exactly once, in declaration order, after
        // the last phase.
        if !cancel.is_cancelled() && !opts.check_mode {
            let unique: Vec<&Task> = config
                .handlers
                .values()
                .filter(|handler| notified.contains(&handler.name))
                .collect();
            for handler in unique {
                let hosts = resolve_hosts(config, handler)?;
                let (result, _) = run_task(&ctx, handler, hosts).await;
                if result.status == TaskStatus::Failed {
                    aborted = true;
                }
                results.insert(format!("handler:{}", handler.name), result);
            }
        }

        ctx.conns.shutdown().await;
        watchdog.abort();

        let tasks: Vec<TaskResult> = results.into_values().collect();
        let tasks_run = tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Ok | TaskStatus::Failed | TaskStatus::Skipped))
            .count();
        let tasks_succeeded = tasks.iter().filter(|t| t.status == TaskStatus::Ok).count();
        let tasks_failed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count();
        let status = if tasks_failed > 0 || aborted || cancel.is_cancelled() {
            RunStatus::Error
        } else {
            RunStatus::Ok
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        self.bus.emit(&Event::PipelineStop {
            pipeline_id: pipeline_id.clone(),
            duration_ms,
            error: (status == RunStatus::Error).then(|| {
                aborted_at
                    .clone()
                    .map(|task| format!("aborted at {task}"))
                    .unwrap_or_else(|| "pipeline failed".to_string())
            }),
        });
        tracing::info!(
            %pipeline_id,
            ?status,
            tasks_run,
            tasks_failed,
            duration_ms,
            "pipeline finished"
        );

        Ok(PipelineResult {
            status,
            duration_ms,
            tasks_run,
            tasks_succeeded,
            tasks_failed,
            aborted_at,
            tasks,
        })
    }
}

/// Expand a task's target into concrete hosts (`None` = local).
fn resolve_hosts(config: &Config, task: &Task) -> Result<Option<Vec<Host>>, RunError> {
    match config.resolve_target(&task.on) {
        Some(ResolvedTarget::Local) => Ok(None),
        Some(ResolvedTarget::Hosts(hosts)) => Ok(Some(hosts.into_iter().cloned().collect())),
        None => Err(RunError::UnresolvableTarget {
            task: task.name.clone(),
            target: task.on.to_string(),
        }),
    }
}

async fn run_task(ctx: &TaskCtx, task: &Task, hosts: Option<Vec<Host>>) -> (TaskResult, Vec<String>) {
    let mut host_results: Vec<HostResult> = Vec::new();
    let mut notified: Vec<String> = Vec::new();

    match hosts {
        None => {
            let (result, host_notified) = run_host(ctx, task, None).await;
            host_results.push(result);
            notified.extend(host_notified);
        }
        Some(hosts) => match task.strategy {
            Strategy::Parallel => {
                let mut join: JoinSet<(usize, HostResult, Vec<String>)> = JoinSet::new();
                for (index, host) in hosts.iter().enumerate() {
                    let ctx = ctx.clone();
                    let task = task.clone();
                    let host = host.clone();
                    join.spawn(async move {
                        let (result, notified) = run_host(&ctx, &task, Some(&host)).await;
                        (index, result, notified)
                    });
                }
                let mut indexed: Vec<(usize, HostResult, Vec<String>)> = Vec::new();
                while let Some(joined) = join.join_next().await {
                    if let Ok(entry) = joined {
                        indexed.push(entry);
                    }
                }
                // Report hosts in declaration order regardless of finish order.
                indexed.sort_by_key(|(index, _, _)| *index);
                for (_, result, host_notified) in indexed {
                    host_results.push(result);
                    notified.extend(host_notified);
                }
            }
            Strategy::Sequential => {
                for host in &hosts {
                    let (result, host_notified) = run_host(ctx, task, Some(host)).await;
                    let failed = result.status == HostStatus::Failed;
                    host_results.push(result);
                    notified.extend(host_notified);
                    if failed && !ctx.continue_on_error {
                        break;
                    }
                }
            }
            Strategy::Rolling => {
                let batch = task.rolling_batch.unwrap_or(1).max(1);
                'batches: for chunk in hosts.chunks(batch) {
                    let mut join: JoinSet<(usize, HostResult, Vec<String>)> = JoinSet::new();
                    for (index, host) in chunk.iter().enumerate() {
                        let ctx = ctx.clone();
                        let task = task.clone();
                        let host = host.clone();
                        join.spawn(async move {
                            let (result, notified) = run_host(&ctx, &task, Some(&host)).await;
                            (index, result, notified)
                        });
                    }
                    let mut indexed: Vec<(usize, HostResult, Vec<String>)> = Vec::new();
                    while let Some(joined) = join.join_next().await {
                        if let Ok(entry) = joined {
                            indexed.push(entry);
                        }
                    }
                    indexed.sort_by_key(|(index, _, _)| *index);
                    let mut batch_failed = false;
                    for (_, result, host_notified) in indexed {
                        batch_failed |= result.status == HostStatus::Failed;
                        host_results.push(result);
                        notified.extend(host_notified);
                    }
                    // A failed batch halts the ones behind it.
                    if batch_failed {
                        break 'batches;
                    }
                }
            }
        },
    }

    let any_failed = host_results.iter().any(|h| h.status == HostStatus::Failed);
    let all_skipped = !host_results.is_empty()
        && host_results.iter().all(|h| h.status == HostStatus::Skipped);
    let mut status = if any_failed {
        TaskStatus::Failed
    } else if all_skipped {
        TaskStatus::Skipped
    } else {
        TaskStatus::Ok
    };

    // Register declared artifacts once the task itself succeeded.
    if status == TaskStatus::Ok && !ctx.check_mode {
        for artifact in &task.artifacts {
            if let Err(e) = ctx
                .store
                .store_file(&ctx.pipeline_id, &artifact.name, &artifact.path)
            {
                tracing::error!(
                    task = %task.name,
                    artifact = %artifact.name,
                    error = %e,
                    "failed to store artifact"
                );
                host_results.push(HostResult {
                    host: ":artifacts".to_string(),
                    status: HostStatus::Failed,
                    command_results: vec![CommandResult {
                        description: format!("store artifact {}", artifact.name),
                        exit_code: None,
                        output: String::new(),
                        error: Some(e.to_string()),
                        duration_ms: 0,
                        changed: None,
                    }],
                });
                status = TaskStatus::Failed;
            }
        }
    }

    (
        TaskResult {
            task: task.name.clone(),
            status,
            host_results,
        },
        notified,
    )
}

/// Run one task on one host (or locally), bracketed by task telemetry.
async fn run_host(ctx: &TaskCtx, task: &Task, host: Option<&Host>) -> (HostResult, Vec<String>) {
    let host_name = host.map(|h| h.name.clone()).unwrap_or_else(|| ":local".to_string());
    let started = Instant::now();

    ctx.bus.emit(&Event::TaskStart {
        pipeline_id: ctx.pipeline_id.clone(),
        task: task.name.clone(),
        host: host_name.clone(),
    });

    let (result, notified) = run_host_inner(ctx, task, host, &host_name).await;

    ctx.bus.emit(&Event::TaskStop {
        pipeline_id: ctx.pipeline_id.clone(),
        task: task.name.clone(),
        host: host_name,
        duration_ms: started.elapsed().as_millis() as u64,
        error: (result.status == HostStatus::Failed).then(|| {
            result
                .command_results
                .iter()
                .find_map(|c| c.error.clone())
                .unwrap_or_else(|| "step failed".to_string())
        }),
    });

    (result, notified)
}

async fn run_host_inner(
    ctx: &TaskCtx,
    task: &Task,
    host: Option<&Host>,
    host_name: &str,
) -> (HostResult, Vec<String>) {
    let lease = match host {
        None => Lease::Local(LocalConnection::new().with_cancel(Arc::clone(&ctx.cancel))),
        Some(host) => match ctx.conns.lease(host).await {
            Ok(lease) => lease,
            Err(e) => {
                tracing::error!(host = %host.name, error = %e, "connection failed");
                return (
                    HostResult {
                        host: host_name.to_string(),
                        status: HostStatus::Failed,
                        command_results: vec![CommandResult {
                            description: format!("connect to {}", host.name),
                            exit_code: None,
                            output: String::new(),
                            error: Some(e.to_string()),
                            duration_ms: 0,
                            changed: None,
                        }],
                    },
                    Vec::new(),
                );
            }
        },
    };
    let conn = lease.conn();

    // Task-level when: gate, evaluated against this host's facts.
    if let Some(when) = &task.when {
        let verdict = ctx
            .cache
            .get_or_gather(conn.host_name(), || async {
                nexus_adapters::facts::gather(conn).await
            })
            .await
            .map_err(|e| e.to_string())
            .and_then(|facts| when.eval(&facts).map_err(|e| e.to_string()));
        match verdict {
            Ok(true) => {}
            Ok(false) => {
                return (
                    HostResult {
                        host: host_name.to_string(),
                        status: HostStatus::Skipped,
                        command_results: Vec::new(),
                    },
                    Vec::new(),
                );
            }
            Err(reason) => {
                tracing::warn!(
                    task = %task.name,
                    host = host_name,
                    %reason,
                    "task when: predicate could not be evaluated; skipping host"
                );
                return (
                    HostResult {
                        host: host_name.to_string(),
                        status: HostStatus::Skipped,
                        command_results: Vec::new(),
                    },
                    Vec::new(),
                );
            }
        }
    }

    let env = StepEnv {
        pipeline_id: &ctx.pipeline_id,
        task: &task.name,
        check_mode: ctx.check_mode,
        artifacts_dir: Some(ctx.artifacts_dir.clone()),
        output: ctx.output.clone(),
    };
    let outcome = ctx.interp.run_steps(&env, conn, &task.steps, &ctx.cache).await;

    let status = if outcome.failed {
        HostStatus::Failed
    } else if outcome.all_skipped && !task.steps.is_empty() {
        HostStatus::Skipped
    } else {
        HostStatus::Ok
    };
    (
        HostResult {
            host: host_name.to_string(),
            status,
            command_results: outcome.results,
        },
        outcome.notified,
    )
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
