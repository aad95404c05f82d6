// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step interpreter
//!
//! Runs the steps of one (task, host) pair in strict program order,
//! gating each on its `when:` predicate, dispatching to the adapters or a
//! resource provider, and emitting command telemetry. A failing step halts
//! the host's remaining steps.

use crate::facts_cache::FactsCache;
use crate::providers::{self, ApplyState, ProviderContext, ProviderRegistry};
use crate::telemetry::TelemetryBus;
use crate::waitfor;
use nexus_adapters::{buffer_chunks, ChunkFn, Connection, ExecError, OutputChunk};
use nexus_core::{CommandResult, Event, Facts, PipelineId, Step, StepAction};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Env var pointing shell steps at this run's artifact directory.
pub const ARTIFACTS_DIR_ENV: &str = "NEXUS_ARTIFACTS_DIR";

/// Immutable context for one (task, host) execution.
pub struct StepEnv<'a> {
    pub pipeline_id: &'a PipelineId,
    pub task: &'a str,
    pub check_mode: bool,
    /// Local directory holding this pipeline's artifacts
    pub artifacts_dir: Option<PathBuf>,
    /// Operator-facing live output callback
    pub output: Option<ChunkFn>,
}

/// Outcome of one (task, host) pair.
#[derive(Debug, Default)]
pub struct HostOutcome {
    pub results: Vec<CommandResult>,
    /// Handlers notified by changed resources, in encounter order
    pub notified: Vec<String>,
    pub failed: bool,
    /// True when every step was skipped by its predicate
    pub all_skipped: bool,
}

pub struct Interpreter {
    registry: Arc<ProviderRegistry>,
    bus: Arc<TelemetryBus>,
}

impl Interpreter {
    pub fn new(registry: Arc<ProviderRegistry>, bus: Arc<TelemetryBus>) -> Self {
        Self { registry, bus }
    }

    async fn facts_for(
        &self,
        cache: &FactsCache,
        conn: &dyn Connection,
    ) -> Result<Facts, ExecError> {
        cache
            .get_or_gather(conn.host_name(), || async {
                nexus_adapters::facts::gather(conn).await
            })
            .await
    }

    /// Run all steps for one host. Strict program order; a failure halts
    /// the remainder.
    pub async fn run_steps(
        &self,
        env: &StepEnv<'_>,
        conn: &dyn Connection,
        steps: &[Step],
        cache: &FactsCache,
    ) -> HostOutcome {
        let mut outcome = HostOutcome {
            all_skipped: !steps.is_empty(),
            ..HostOutcome::default()
        };

        for step in steps {
            let description = step.action.describe();

            // when: gate. Missing predicate means run; an evaluation error
            // demotes the step to a skip with a warning, not a failure.
            if let Some(when) = &step.when {
                let verdict = match self.facts_for(cache, conn).await {
                    Ok(facts) => when.eval(&facts).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                match verdict {
                    Ok(true) => {}
                    Ok(false) => {
                        outcome.results.push(CommandResult::skipped(description.clone()));
                        continue;
                    }
                    Err(reason) => {
                        tracing::warn!(
                            task = env.task,
                            host = conn.host_name(),
                            step = %description,
                            %reason,
                            "when: predicate could not be evaluated; skipping step"
                        );
                        outcome.results.push(CommandResult::skipped(description.clone()));
                        continue;
                    }
                }
            }
            outcome.all_skipped = false;

            self.bus.emit(&Event::CommandStart {
                pipeline_id: env.pipeline_id.clone(),
                task: env.task.to_string(),
                host: conn.host_name().to_string(),
                command: description.clone(),
            });

            let (result, notify) = self.run_action(env, conn, step, cache).await;

            self.bus.emit(&Event::CommandStop {
                pipeline_id: env.pipeline_id.clone(),
                task: env.task.to_string(),
                host: conn.host_name().to_string(),
                output: result.output.clone(),
                exit_code: result.exit_code,
                error: result.error.clone(),
            });

            let failed = result.is_failure();
            outcome.results.push(result);
            if let Some(handler) = notify {
                outcome.notified.push(handler);
            }
            if failed {
                outcome.failed = true;
                break;
            }
        }
        outcome
    }

    async fn run_action(
        &self,
        env: &StepEnv<'_>,
        conn: &dyn Connection,
        step: &Step,
        cache: &FactsCache,
    ) -> (CommandResult, Option<String>) {
        let description = step.action.describe();
        let start = Instant::now();
        let finish = |exit_code, output, error, changed| CommandResult {
            description: description.clone(),
            exit_code,
            output,
            error,
            duration_ms: start.elapsed().as_millis() as u64,
            changed,
        };

        match &step.action {
            StepAction::Shell {
                cmd,
                env: step_env,
                timeout_secs,
                sudo,
            } => {
                let mut shell_env = step_env.clone();
                if let Some(dir) = &env.artifacts_dir {
                    shell_env.insert(
                        ARTIFACTS_DIR_ENV.to_string(),
                        dir.display().to_string(),
                    );
                }
                if env.check_mode {
                    // Commands are not idempotence-aware; never run them in
                    // check mode.
                    return (
                        CommandResult::skipped(format!("{description} (check mode)")),
                        None,
                    );
                }

                let (collect, buffer) = buffer_chunks();
                let forward = env.output.clone();
                let tee: ChunkFn = Arc::new(move |chunk: OutputChunk| {
                    collect(chunk.clone());
                    if let Some(forward) = &forward {
                        forward(chunk);
                    }
                });

                match conn
                    .exec_streaming(
                        cmd,
                        &shell_env,
                        Duration::from_secs(*timeout_secs),
                        *sudo,
                        tee,
                    )
                    .await
                {
                    Ok(exit_code) => {
                        let output =
                            String::from_utf8_lossy(&buffer.lock()).into_owned();
                        (finish(Some(exit_code), output, None, None), None)
                    }
                    Err(e) => {
                        let output =
                            String::from_utf8_lossy(&buffer.lock()).into_owned();
                        (finish(None, output, Some(e.to_string()), None), None)
                    }
                }
            }

            StepAction::Upload {
                local_path,
                remote_path,
                mode,
                sudo,
            } => {
                if env.check_mode {
                    return (
                        CommandResult::skipped(format!("{description} (check mode)")),
                        None,
                    );
                }
                match conn.upload(local_path, remote_path, *mode, *sudo).await {
                    Ok(()) => (finish(None, String::new(), None, None), None),
                    Err(e) => (finish(None, String::new(), Some(e.to_string()), None), None),
                }
            }

            StepAction::Download {
                remote_path,
                local_path,
                sudo,
            } => {
                if env.check_mode {
                    return (
                        CommandResult::skipped(format!("{description} (check mode)")),
                        None,
                    );
                }
                match conn.download(remote_path, local_path, *sudo).await {
                    Ok(()) => (finish(None, String::new(), None, None), None),
                    Err(e) => (finish(None, String::new(), Some(e.to_string()), None), None),
                }
            }

            StepAction::Template {
                source_path,
                destination,
                vars,
                mode,
                sudo,
                notify,
            } => {
                let source = match std::fs::read_to_string(source_path) {
                    Ok(source) => source,
                    Err(e) => {
                        return (
                            finish(
                                None,
                                String::new(),
                                Some(format!(
                                    "cannot read template {}: {e}",
                                    source_path.display()
                                )),
                                None,
                            ),
                            None,
                        )
                    }
                };
                // Render locally before any remote side effect.
                let rendered = match nexus_config::render(&source, vars) {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        return (finish(None, String::new(), Some(e.to_string()), None), None)
                    }
                };

                let current = match conn.read_file(destination, *sudo).await {
                    Ok(current) => current,
                    Err(e) => {
                        return (finish(None, String::new(), Some(e.to_string()), None), None)
                    }
                };
                let unchanged = current.as_deref() == Some(rendered.as_bytes());
                if unchanged {
                    return (finish(None, String::new(), None, Some(false)), None);
                }
                if env.check_mode {
                    return (
                        CommandResult::skipped(format!("{description} (check mode)")),
                        None,
                    );
                }
                match conn
                    .write_file(destination, rendered.as_bytes(), *mode, *sudo)
                    .await
                {
                    Ok(()) => (
                        finish(None, String::new(), None, Some(true)),
                        notify.clone(),
                    ),
                    Err(e) => (finish(None, String::new(), Some(e.to_string()), None), None),
                }
            }

            StepAction::WaitFor(spec) => {
                if env.check_mode {
                    return (
                        CommandResult::skipped(format!("{description} (check mode)")),
                        None,
                    );
                }
                match waitfor::wait_for(spec, conn).await {
                    Ok(()) => (finish(None, String::new(), None, None), None),
                    Err(e) => (finish(None, String::new(), Some(e.to_string()), None), None),
                }
            }

            StepAction::Resource { spec, sudo } => {
                let os_family = match self.facts_for(cache, conn).await {
                    Ok(facts) => facts.os_family,
                    Err(e) => {
                        return (
                            finish(
                                None,
                                String::new(),
                                Some(format!("cannot gather facts: {e}")),
                                None,
                            ),
                            None,
                        )
                    }
                };
                let provider = self.registry.lookup(spec.kind(), &os_family);
                let ctx = ProviderContext {
                    check_mode: env.check_mode,
                    os_family,
                    sudo: *sudo,
                };
                let applied = providers::apply(provider.as_ref(), spec, conn, &ctx).await;
                let changed = applied.state == ApplyState::Changed;
                let output = applied
                    .diff
                    .as_ref()
                    .map(|diff| diff.changes.join(", "))
                    .unwrap_or_default();
                let error = match applied.state {
                    ApplyState::Failed => Some(applied.description.clone()),
                    _ => None,
                };
                let result = CommandResult {
                    description: applied.description.clone(),
                    exit_code: None,
                    output,
                    error,
                    duration_ms: applied.duration_ms,
                    changed: Some(changed),
                };
                (result, applied.notify)
            }
        }
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
