// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell quoting
//!
//! Every user-supplied string interpolated into a shell command line goes
//! through [`sh_quote`]: the whole value is single-quoted and embedded
//! single quotes become `'\''`. Path-like arguments are quoted whole,
//! never spliced bare.

/// Single-quote `s` for POSIX sh.
pub fn sh_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Quote a path for use in a remote shell command.
pub fn sh_quote_path(path: &std::path::Path) -> String {
    sh_quote(&path.to_string_lossy())
}

/// Build an env-prefixed `sh -c` invocation: `K='v' K2='v2' sh -c '<cmd>'`.
///
/// SSH servers routinely refuse `setenv` for arbitrary names, so both the
/// local and remote executors pass environment this way.
pub fn wrap_command(cmd: &str, env: &std::collections::HashMap<String, String>) -> String {
    let mut line = String::new();
    // Sort for a stable command line; HashMap order is not.
    let mut keys: Vec<&String> = env.keys().collect();
    keys.sort();
    for key in keys {
        if let Some(value) = env.get(key) {
            line.push_str(key);
            line.push('=');
            line.push_str(&sh_quote(value));
            line.push(' ');
        }
    }
    line.push_str("sh -c ");
    line.push_str(&sh_quote(cmd));
    line
}

/// Wrap a command in non-interactive sudo.
pub fn wrap_sudo(cmd: &str) -> String {
    format!("sudo -n sh -c {}", sh_quote(cmd))
}

#[cfg(test)]
#[path = "quote_tests.rs"]
mod tests;
