// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::providers::ProviderRegistry;
use nexus_adapters::LocalConnection;
use nexus_core::{Condition, DesiredState, ResourceSpec, Task, WaitForKind, WaitForSpec};
use parking_lot::Mutex;

fn interpreter() -> (Interpreter, Arc<TelemetryBus>) {
    let bus = Arc::new(TelemetryBus::new());
    (
        Interpreter::new(Arc::new(ProviderRegistry::standard()), Arc::clone(&bus)),
        bus,
    )
}

fn env<'a>(pipeline_id: &'a PipelineId) -> StepEnv<'a> {
    StepEnv {
        pipeline_id,
        task: "test-task",
        check_mode: false,
        artifacts_dir: None,
        output: None,
    }
}

fn shell(cmd: &str) -> Step {
    Task::named("t").with_shell(cmd).steps.remove(0)
}

#[tokio::test]
async fn runs_steps_in_program_order() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();

    let steps = vec![shell("echo one"), shell("echo two")];
    let outcome = interp.run_steps(&env(&pid), &conn, &steps, &cache).await;

    assert!(!outcome.failed);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results[0].output.contains("one"));
    assert!(outcome.results[1].output.contains("two"));
}

#[tokio::test]
async fn failing_step_halts_the_host() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();

    let steps = vec![shell("echo first"), shell("exit 9"), shell("echo never")];
    let outcome = interp.run_steps(&env(&pid), &conn, &steps, &cache).await;

    assert!(outcome.failed);
    assert_eq!(outcome.results.len(), 2, "third step must not run");
    assert_eq!(outcome.results[1].exit_code, Some(9));
}

#[tokio::test]
async fn false_when_skips_without_failing() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();

    let mut gated = shell("echo gated");
    gated.when = Some(Condition::fact_eq("os_family", "definitely-not-real"));
    let steps = vec![gated, shell("echo ran")];
    let outcome = interp.run_steps(&env(&pid), &conn, &steps, &cache).await;

    assert!(!outcome.failed);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results[0].output.is_empty());
    assert!(outcome.results[1].output.contains("ran"));
    // Facts were gathered lazily for the predicate.
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn when_eval_error_is_a_skip_with_warning_not_a_failure() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();

    // Literal int is not a boolean: evaluation error.
    let mut broken = shell("echo x");
    broken.when = Some(Condition::Literal(nexus_core::Value::Int(1)));
    let steps = vec![broken, shell("echo after")];
    let outcome = interp.run_steps(&env(&pid), &conn, &steps, &cache).await;

    assert!(!outcome.failed);
    assert_eq!(outcome.results.len(), 2);
}

#[tokio::test]
async fn command_telemetry_brackets_each_step() {
    let (interp, bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    bus.attach(
        "test",
        &["command:*"],
        Arc::new(move |event: &nexus_core::Event| {
            sink_seen.lock().push(event.topic().to_string());
        }),
    );

    let steps = vec![shell("echo a"), shell("echo b")];
    let _ = interp.run_steps(&env(&pid), &conn, &steps, &cache).await;

    assert_eq!(
        &*seen.lock(),
        &[
            "command:start",
            "command:stop",
            "command:start",
            "command:stop"
        ]
    );
}

#[tokio::test]
async fn template_renders_locally_then_writes() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("app.conf.tpl");
    std::fs::write(&source, "port = <%= port %>\n").unwrap();
    let dest = dir.path().join("app.conf");

    let mut vars = std::collections::HashMap::new();
    vars.insert("port".to_string(), "8080".to_string());
    let step = Step::new(StepAction::Template {
        source_path: source.clone(),
        destination: dest.clone(),
        vars: vars.clone(),
        mode: None,
        sudo: false,
        notify: Some("reload-app".to_string()),
    });

    let outcome = interp
        .run_steps(&env(&pid), &conn, std::slice::from_ref(&step), &cache)
        .await;
    assert!(!outcome.failed);
    assert_eq!(outcome.results[0].changed, Some(true));
    assert_eq!(outcome.notified, vec!["reload-app"]);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "port = 8080\n");

    // Re-running with identical content is unchanged and does not notify.
    let outcome = interp
        .run_steps(&env(&pid), &conn, std::slice::from_ref(&step), &cache)
        .await;
    assert_eq!(outcome.results[0].changed, Some(false));
    assert!(outcome.notified.is_empty());
}

#[tokio::test]
async fn template_with_unknown_var_fails_without_side_effects() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("bad.tpl");
    std::fs::write(&source, "value = <%= missing %>\n").unwrap();
    let dest = dir.path().join("bad.conf");

    let step = Step::new(StepAction::Template {
        source_path: source,
        destination: dest.clone(),
        vars: std::collections::HashMap::new(),
        mode: None,
        sudo: false,
        notify: None,
    });
    let outcome = interp
        .run_steps(&env(&pid), &conn, &[step], &cache)
        .await;

    assert!(outcome.failed);
    assert!(!dest.exists(), "failed render must not touch the target");
}

#[tokio::test]
async fn resource_step_reports_changed_and_notifies() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("managed.txt");

    let step = Step::new(StepAction::Resource {
        spec: ResourceSpec::File {
            path: path.clone(),
            content: Some("managed".to_string()),
            source: None,
            owner: None,
            group: None,
            mode: None,
            state: DesiredState::Present,
            notify: Some("restart".to_string()),
        },
        sudo: false,
    });

    let outcome = interp
        .run_steps(&env(&pid), &conn, std::slice::from_ref(&step), &cache)
        .await;
    assert!(!outcome.failed);
    assert_eq!(outcome.results[0].changed, Some(true));
    assert_eq!(outcome.notified, vec!["restart"]);

    let outcome = interp
        .run_steps(&env(&pid), &conn, std::slice::from_ref(&step), &cache)
        .await;
    assert_eq!(outcome.results[0].changed, Some(false));
    assert!(outcome.notified.is_empty());
}

#[tokio::test]
async fn wait_for_command_step_integrates() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();

    let step = Step::new(StepAction::WaitFor(WaitForSpec {
        kind: WaitForKind::Command,
        target: "true".to_string(),
        timeout_ms: 2_000,
        interval_ms: 50,
        expected_status: None,
        expected_body: None,
    }));
    let outcome = interp.run_steps(&env(&pid), &conn, &[step], &cache).await;
    assert!(!outcome.failed);
}

#[tokio::test]
async fn check_mode_skips_shell_but_diffs_resources() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("would-create.txt");

    let resource = Step::new(StepAction::Resource {
        spec: ResourceSpec::File {
            path: path.clone(),
            content: Some("x".to_string()),
            source: None,
            owner: None,
            group: None,
            mode: None,
            state: DesiredState::Present,
            notify: Some("never-in-check-mode".to_string()),
        },
        sudo: false,
    });
    let steps = vec![shell("touch should-not-happen"), resource];

    let check_env = StepEnv {
        check_mode: true,
        ..env(&pid)
    };
    let outcome = interp.run_steps(&check_env, &conn, &steps, &cache).await;

    assert!(!outcome.failed);
    assert!(!path.exists());
    assert!(outcome.notified.is_empty());
    assert_eq!(outcome.results[1].changed, Some(false));
}

#[tokio::test]
async fn artifacts_dir_is_exposed_to_shell_steps() {
    let (interp, _bus) = interpreter();
    let pid = PipelineId::generate();
    let conn = LocalConnection::new();
    let cache = FactsCache::new();
    let dir = tempfile::tempdir().unwrap();

    let step = shell("printf '%s' \"$NEXUS_ARTIFACTS_DIR\"");
    let step_env = StepEnv {
        artifacts_dir: Some(dir.path().to_path_buf()),
        ..env(&pid)
    };
    let outcome = interp.run_steps(&step_env, &conn, &[step], &cache).await;
    assert_eq!(outcome.results[0].output, dir.path().display().to_string());
}
