// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "hello", "'hello'" },
    empty = { "", "''" },
    spaces = { "a b c", "'a b c'" },
    single_quote = { "it's", r"'it'\''s'" },
    only_quote = { "'", r"''\'''" },
    dollar = { "$HOME", "'$HOME'" },
    backtick = { "`id`", "'`id`'" },
    semicolon = { "a; rm -rf /", "'a; rm -rf /'" },
)]
fn quoting(input: &str, expected: &str) {
    assert_eq!(sh_quote(input), expected);
}

#[test]
fn wrap_command_sorts_env_keys() {
    let mut env = std::collections::HashMap::new();
    env.insert("ZED".to_string(), "1".to_string());
    env.insert("ABC".to_string(), "two words".to_string());
    let line = wrap_command("echo $ABC", &env);
    assert_eq!(line, "ABC='two words' ZED='1' sh -c 'echo $ABC'");
}

#[test]
fn wrap_command_without_env() {
    let line = wrap_command("uptime", &std::collections::HashMap::new());
    assert_eq!(line, "sh -c 'uptime'");
}

#[test]
fn wrap_sudo_quotes_whole_command() {
    assert_eq!(
        wrap_sudo("apt-get install -y nginx"),
        "sudo -n sh -c 'apt-get install -y nginx'"
    );
}

#[test]
fn quote_path_handles_spaces() {
    let path = std::path::Path::new("/tmp/with space/file");
    assert_eq!(sh_quote_path(path), "'/tmp/with space/file'");
}
