// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use nexus_config::Config;
use parking_lot::Mutex as PlMutex;

fn local_config(text: &str) -> Config {
    Config::parse(text).unwrap()
}

fn opts_with_data_dir(dir: &std::path::Path) -> RunOptions {
    RunOptions {
        data_dir: Some(dir.to_path_buf()),
        ..RunOptions::default()
    }
}

#[tokio::test]
async fn linear_chain_runs_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("order.txt");
    let config = local_config(&format!(
        r#"
[tasks.build]
on = ":local"
[[tasks.build.steps]]
type = "shell"
cmd = "echo b >> {out}"

[tasks.test]
on = ":local"
deps = ["build"]
[[tasks.test.steps]]
type = "shell"
cmd = "echo t >> {out}"

[tasks.deploy]
on = ":local"
deps = ["test"]
[[tasks.deploy.steps]]
type = "shell"
cmd = "echo d >> {out}"
"#,
        out = out.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.tasks_run, 3);
    assert_eq!(result.tasks_succeeded, 3);
    assert_eq!(result.tasks_failed, 0);
    assert!(result.aborted_at.is_none());
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "b\nt\nd\n");
}

#[tokio::test]
async fn dry_run_reports_phases_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let config = local_config(&format!(
        r#"
[tasks.a]
on = ":local"
[[tasks.a.steps]]
type = "shell"
cmd = "touch {}"

[tasks.b]
on = ":local"
deps = ["a"]

[tasks.c]
on = ":local"
deps = ["a"]

[tasks.d]
on = ":local"
deps = ["b", "c"]
"#,
        marker.display()
    ));

    let runner = Runner::new();
    let plan = runner.dry_run(&config, &[]).unwrap();
    assert_eq!(plan.total_tasks, 4);
    assert_eq!(
        plan.phases,
        vec![vec!["a"], vec!["b", "c"], vec!["d"]]
    );
    assert!(!marker.exists());
}

#[tokio::test]
async fn failed_task_aborts_dependents_and_later_phases() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(
        r#"
[tasks.build]
on = ":local"
[[tasks.build.steps]]
type = "shell"
cmd = "exit 1"

[tasks.deploy]
on = ":local"
deps = ["build"]
[[tasks.deploy.steps]]
type = "shell"
cmd = "echo never"
"#,
    );

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.tasks_succeeded, 0);
    assert_eq!(result.tasks_failed, 1);
    assert_eq!(result.aborted_at.as_deref(), Some("build"));
    let deploy = result.tasks.iter().find(|t| t.task == "deploy").unwrap();
    assert_eq!(deploy.status, TaskStatus::SkippedDependency);
}

#[tokio::test]
async fn continue_on_error_still_skips_dependents_but_runs_independents() {
    let dir = tempfile::tempdir().unwrap();
    let other = dir.path().join("other-ran");
    let config = local_config(&format!(
        r#"
[tasks.build]
on = ":local"
[[tasks.build.steps]]
type = "shell"
cmd = "exit 1"

[tasks.deploy]
on = ":local"
deps = ["build"]

[tasks.standalone]
on = ":local"
deps = ["unrelated"]
[[tasks.standalone.steps]]
type = "shell"
cmd = "touch {}"

[tasks.unrelated]
on = ":local"
[[tasks.unrelated.steps]]
type = "shell"
cmd = "true"
"#,
        other.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(
            &config,
            &[],
            RunOptions {
                continue_on_error: true,
                ..opts_with_data_dir(dir.path())
            },
        )
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Error);
    let deploy = result.tasks.iter().find(|t| t.task == "deploy").unwrap();
    assert_eq!(deploy.status, TaskStatus::SkippedDependency);
    let standalone = result.tasks.iter().find(|t| t.task == "standalone").unwrap();
    assert_eq!(standalone.status, TaskStatus::Ok);
    assert!(other.exists(), "independent later-phase task must run");
}

#[tokio::test]
async fn select_with_deps_runs_only_the_requested_closure() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs-ran");
    let config = local_config(&format!(
        r#"
[tasks.base]
on = ":local"
[[tasks.base.steps]]
type = "shell"
cmd = "true"

[tasks.app]
on = ":local"
deps = ["base"]
[[tasks.app.steps]]
type = "shell"
cmd = "true"

[tasks.docs]
on = ":local"
[[tasks.docs.steps]]
type = "shell"
cmd = "touch {}"
"#,
        docs.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(
            &config,
            &["app".to_string()],
            opts_with_data_dir(dir.path()),
        )
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.tasks_run, 2);
    assert!(!docs.exists(), "unselected task must not run");
}

#[tokio::test]
async fn empty_config_is_ok_with_zero_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config("");
    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();
    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.tasks_run, 0);
    assert!(result.tasks.is_empty());
}

#[tokio::test]
async fn sequential_strategy_halts_on_first_host_failure() {
    let dir = tempfile::tempdir().unwrap();
    // The second host to run fails, via a shared counter file.
    let counter = dir.path().join("count");
    let config = local_config(&format!(
        r#"
[hosts.n1]
hostname = "n1"
connection = "local"
[hosts.n2]
hostname = "n2"
connection = "local"
[hosts.n3]
hostname = "n3"
connection = "local"

[groups.fleet]
hosts = ["n1", "n2", "n3"]

[tasks.roll]
on = "fleet"
strategy = "sequential"
[[tasks.roll.steps]]
type = "shell"
cmd = "echo x >> {counter}; test $(wc -l < {counter}) -ne 2"
"#,
        counter = counter.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Error);
    let roll = result.tasks.iter().find(|t| t.task == "roll").unwrap();
    assert_eq!(roll.status, TaskStatus::Failed);
    // Hosts ran in order; the third never started.
    assert_eq!(roll.host_results.len(), 2);
    assert_eq!(roll.host_results[0].host, "n1");
    assert_eq!(roll.host_results[0].status, HostStatus::Ok);
    assert_eq!(roll.host_results[1].host, "n2");
    assert_eq!(roll.host_results[1].status, HostStatus::Failed);
}

#[tokio::test]
async fn rolling_strategy_halts_later_batches() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("count");
    let config = local_config(&format!(
        r#"
[hosts.r1]
hostname = "r1"
connection = "local"
[hosts.r2]
hostname = "r2"
connection = "local"
[hosts.r3]
hostname = "r3"
connection = "local"
[hosts.r4]
hostname = "r4"
connection = "local"

[groups.fleet]
hosts = ["r1", "r2", "r3", "r4"]

[tasks.roll]
on = "fleet"
strategy = "rolling"
rolling_batch = 2
[[tasks.roll.steps]]
type = "shell"
cmd = "echo x >> {counter}; test $(wc -l < {counter}) -le 2"
"#,
        counter = counter.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    // Batch one (r1, r2) passes; batch two fails and r4's batch... r3/r4
    // are one batch, so both run and at least one fails; there is no third
    // batch. The important bits: not all four hosts can succeed, and the
    // task is failed.
    let roll = result.tasks.iter().find(|t| t.task == "roll").unwrap();
    assert_eq!(roll.status, TaskStatus::Failed);
    assert_eq!(roll.host_results.len(), 4);
    assert_eq!(result.status, RunStatus::Error);
}

#[tokio::test]
async fn rolling_failure_in_first_batch_stops_remaining_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(
        r#"
[hosts.r1]
hostname = "r1"
connection = "local"
[hosts.r2]
hostname = "r2"
connection = "local"

[groups.fleet]
hosts = ["r1", "r2"]

[tasks.roll]
on = "fleet"
strategy = "rolling"
rolling_batch = 1
[[tasks.roll.steps]]
type = "shell"
cmd = "exit 1"
"#,
    );

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    let roll = result.tasks.iter().find(|t| t.task == "roll").unwrap();
    assert_eq!(roll.status, TaskStatus::Failed);
    assert_eq!(
        roll.host_results.len(),
        1,
        "second batch must not start after the first fails"
    );
}

#[tokio::test]
async fn parallel_limit_one_still_respects_phase_structure() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("order.txt");
    let config = local_config(&format!(
        r#"
[tasks.a]
on = ":local"
[[tasks.a.steps]]
type = "shell"
cmd = "echo a >> {out}"

[tasks.b]
on = ":local"
[[tasks.b.steps]]
type = "shell"
cmd = "echo b >> {out}"

[tasks.late]
on = ":local"
deps = ["a", "b"]
[[tasks.late.steps]]
type = "shell"
cmd = "echo late >> {out}"
"#,
        out = out.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(
            &config,
            &[],
            RunOptions {
                parallel_limit: 1,
                ..opts_with_data_dir(dir.path())
            },
        )
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.ends_with("late\n"), "late must run after a and b: {content:?}");
}

#[tokio::test]
async fn tags_filter_drops_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let tagged = dir.path().join("tagged");
    let skipped = dir.path().join("skipped");
    let config = local_config(&format!(
        r#"
[tasks.wanted]
on = ":local"
tags = ["deploy"]
[[tasks.wanted.steps]]
type = "shell"
cmd = "touch {tagged}"

[tasks.unwanted]
on = ":local"
tags = ["slow"]
[[tasks.unwanted.steps]]
type = "shell"
cmd = "touch {skipped}"
"#,
        tagged = tagged.display(),
        skipped = skipped.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(
            &config,
            &[],
            RunOptions {
                tags: vec!["deploy".to_string()],
                ..opts_with_data_dir(dir.path())
            },
        )
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert!(tagged.exists());
    assert!(!skipped.exists());

    // skip_tags drops the matching task even without a tags filter.
    std::fs::remove_file(&tagged).unwrap();
    let result = runner
        .run(
            &config,
            &[],
            RunOptions {
                skip_tags: vec!["slow".to_string()],
                ..opts_with_data_dir(dir.path())
            },
        )
        .await
        .unwrap();
    assert_eq!(result.status, RunStatus::Ok);
    assert!(tagged.exists());
    assert!(!skipped.exists());
}

#[tokio::test]
async fn handlers_run_once_in_declaration_order_after_phases() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("handlers.txt");
    let managed_a = dir.path().join("a.conf");
    let managed_b = dir.path().join("b.conf");
    let config = local_config(&format!(
        r#"
[tasks.configure]
on = ":local"
[[tasks.configure.steps]]
type = "resource"
kind = "file"
path = "{a}"
content = "a"
notify = "reload"
[[tasks.configure.steps]]
type = "resource"
kind = "file"
path = "{b}"
content = "b"
notify = "reload"

[handlers.reload]
on = ":local"
[[handlers.reload.steps]]
type = "shell"
cmd = "echo reload >> {log}"

[handlers.unused]
on = ":local"
[[handlers.unused.steps]]
type = "shell"
cmd = "echo unused >> {log}"
"#,
        a = managed_a.display(),
        b = managed_b.display(),
        log = log.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    // Two resources notified the same handler; it still ran exactly once,
    // and the un-notified handler never ran.
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "reload\n");

    // Second run: nothing changes, handler does not fire.
    std::fs::remove_file(&log).ok();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();
    assert_eq!(result.status, RunStatus::Ok);
    assert!(!log.exists(), "unchanged resources must not notify");
}

#[tokio::test]
async fn check_mode_reports_would_change_without_touching_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let managed = dir.path().join("managed.conf");
    let config = local_config(&format!(
        r#"
[tasks.configure]
on = ":local"
[[tasks.configure.steps]]
type = "resource"
kind = "file"
path = "{}"
content = "x"
"#,
        managed.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(
            &config,
            &[],
            RunOptions {
                check_mode: true,
                ..opts_with_data_dir(dir.path())
            },
        )
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert!(!managed.exists());
}

#[tokio::test]
async fn artifacts_are_stored_and_visible_to_dependents() {
    let dir = tempfile::tempdir().unwrap();
    let produced = dir.path().join("bundle.txt");
    let consumed = dir.path().join("copied.txt");
    let config = local_config(&format!(
        r#"
[tasks.build]
on = ":local"
artifacts = [{{ name = "bundle.txt", path = "{produced}" }}]
[[tasks.build.steps]]
type = "shell"
cmd = "echo payload > {produced}"

[tasks.consume]
on = ":local"
deps = ["build"]
[[tasks.consume.steps]]
type = "shell"
cmd = "cp \"$NEXUS_ARTIFACTS_DIR/bundle.txt\" {consumed}"
"#,
        produced = produced.display(),
        consumed = consumed.display()
    ));

    let runner = Runner::new();
    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(
        std::fs::read_to_string(&consumed).unwrap().trim(),
        "payload"
    );
}

#[tokio::test]
async fn cancellation_aborts_in_flight_work() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(
        r#"
[tasks.slow]
on = ":local"
[[tasks.slow.steps]]
type = "shell"
cmd = "sleep 30"

[tasks.after]
on = ":local"
deps = ["slow"]
[[tasks.after.steps]]
type = "shell"
cmd = "true"
"#,
    );

    let cancel = nexus_adapters::CancelToken::new();
    let runner = Runner::new();
    let run = {
        let cancel = Arc::clone(&cancel);
        let opts = RunOptions {
            cancel: Some(cancel),
            ..opts_with_data_dir(dir.path())
        };
        async move { runner.run(&config, &[], opts).await }
    };
    let handle = tokio::spawn(run);

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(15), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(result.status, RunStatus::Error);
    assert!(result.aborted_at.is_some());
}

#[tokio::test]
async fn telemetry_brackets_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(
        r#"
[tasks.only]
on = ":local"
[[tasks.only.steps]]
type = "shell"
cmd = "true"
"#,
    );

    let runner = Runner::new();
    let seen = Arc::new(PlMutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    runner.bus().attach(
        "test",
        &["*"],
        Arc::new(move |event: &Event| {
            sink_seen.lock().push(event.topic().to_string());
        }),
    );

    let result = runner
        .run(&config, &[], opts_with_data_dir(dir.path()))
        .await
        .unwrap();
    assert_eq!(result.status, RunStatus::Ok);

    let topics = seen.lock().clone();
    assert_eq!(topics.first().map(String::as_str), Some("pipeline:start"));
    assert_eq!(topics.last().map(String::as_str), Some("pipeline:stop"));
    assert!(topics.contains(&"task:start".to_string()));
    assert!(topics.contains(&"command:stop".to_string()));
}

#[tokio::test]
async fn parallel_pipelines_do_not_share_fact_caches() {
    // Two runs in flight at once, each with its own cache and store.
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let config = local_config(
        r#"
[tasks.probe]
on = ":local"
[[tasks.probe.steps]]
type = "shell"
cmd = "true"
when = { fact = "os", ne = "plan9" }
"#,
    );

    let runner_a = Runner::new();
    let runner_b = Runner::new();
    let (a, b) = tokio::join!(
        runner_a.run(&config, &[], opts_with_data_dir(dir_a.path())),
        runner_b.run(&config, &[], opts_with_data_dir(dir_b.path())),
    );
    assert_eq!(a.unwrap().status, RunStatus::Ok);
    assert_eq!(b.unwrap().status, RunStatus::Ok);
}
