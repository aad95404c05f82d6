// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn command_result_failure_detection() {
    let ok = CommandResult {
        description: "shell: true".to_string(),
        exit_code: Some(0),
        output: String::new(),
        error: None,
        duration_ms: 1,
        changed: None,
    };
    assert!(!ok.is_failure());

    let nonzero = CommandResult {
        exit_code: Some(3),
        ..ok.clone()
    };
    assert!(nonzero.is_failure());

    let errored = CommandResult {
        error: Some("timed out".to_string()),
        ..ok
    };
    assert!(errored.is_failure());
}

#[test]
fn summary_json_matches_schema() {
    let result = PipelineResult {
        status: RunStatus::Error,
        duration_ms: 1234,
        tasks_run: 2,
        tasks_succeeded: 1,
        tasks_failed: 1,
        aborted_at: Some("build".to_string()),
        tasks: Vec::new(),
    };
    let json = result.summary_json();
    assert_eq!(json["status"], "error");
    assert_eq!(json["duration_ms"], 1234);
    assert_eq!(json["tasks_run"], 2);
    assert_eq!(json["tasks_succeeded"], 1);
    assert_eq!(json["tasks_failed"], 1);
    assert_eq!(json["aborted_at"], "build");
    assert_eq!(json.as_object().unwrap().len(), 6);
}

#[test]
fn skipped_dependency_serializes_with_full_name() {
    let json = serde_json::to_string(&TaskStatus::SkippedDependency).unwrap();
    assert_eq!(json, "\"skipped_due_to_dependency\"");
}
