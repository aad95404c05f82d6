// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::Config;

fn parse(text: &str) -> Config {
    Config::parse(text).unwrap()
}

#[test]
fn valid_config_passes() {
    let config = parse(
        r#"
[hosts.a]
hostname = "10.0.0.1"

[groups.all]
hosts = ["a"]

[tasks.build]
on = ":local"

[tasks.deploy]
on = "all"
deps = ["build"]
"#,
    );
    assert!(validate(&config).is_ok());
}

#[test]
fn unknown_dep_is_reported() {
    let config = parse(
        r#"
[tasks.deploy]
on = ":local"
deps = ["missing"]
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert_eq!(
        errors,
        vec![ValidateError::UnknownDep {
            task: "deploy".to_string(),
            dep: "missing".to_string(),
        }]
    );
}

#[test]
fn unknown_target_is_reported() {
    let config = parse(
        r#"
[tasks.deploy]
on = "nowhere"
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert!(matches!(
        errors[0],
        ValidateError::UnknownTarget { .. }
    ));
}

#[test]
fn unknown_group_member_is_reported() {
    let config = parse(
        r#"
[groups.web]
hosts = ["ghost"]
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert_eq!(
        errors,
        vec![ValidateError::UnknownGroupMember {
            group: "web".to_string(),
            host: "ghost".to_string(),
        }]
    );
}

#[test]
fn unknown_notify_handler_is_reported() {
    let config = parse(
        r#"
[tasks.setup]
on = ":local"

[[tasks.setup.steps]]
type = "resource"
kind = "file"
path = "/tmp/x"
content = "hi"
notify = "no-such-handler"
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert!(matches!(errors[0], ValidateError::UnknownHandler { .. }));
}

#[test]
fn rolling_without_batch_is_reported() {
    let config = parse(
        r#"
[hosts.a]
hostname = "10.0.0.1"

[tasks.deploy]
on = "a"
strategy = "rolling"
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert!(matches!(
        errors[0],
        ValidateError::MissingRollingBatch { .. }
    ));
}

#[test]
fn invalid_artifact_name_is_reported() {
    let config = parse(
        r#"
[tasks.build]
on = ":local"
artifacts = [{ name = "../evil", path = "out.tar" }]
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert!(matches!(
        errors[0],
        ValidateError::InvalidArtifactName { .. }
    ));
}

#[test]
fn multiple_errors_are_collected() {
    let config = parse(
        r#"
[tasks.a]
on = "ghost-host"
deps = ["ghost-task"]
"#,
    );
    let errors = validate(&config).unwrap_err();
    assert_eq!(errors.len(), 2);
}
