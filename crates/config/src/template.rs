// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template variable substitution
//!
//! Variable syntax is `<%= name %>`. Rendering is deterministic: every
//! placeholder must resolve, and nothing else in the file is touched.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<%=\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*%>").expect("constant regex pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template references unknown variable: {0}")]
    UnknownVar(String),
}

/// Substitute `<%= name %>` placeholders from the vars map.
///
/// Unknown variables are an error, not a silent pass-through: a template
/// rendered with a typo'd var name must fail before anything touches the
/// remote host.
pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut missing = None;
    let rendered = VAR_PATTERN.replace_all(template, |caps: &regex::Captures| {
        let name = &caps[1];
        match vars.get(name) {
            Some(value) => value.clone(),
            None => {
                if missing.is_none() {
                    missing = Some(name.to_string());
                }
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(TemplateError::UnknownVar(name)),
        None => Ok(rendered.to_string()),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
