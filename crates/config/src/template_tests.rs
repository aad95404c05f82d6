// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[parameterized(
    plain = { "port = <%= port %>", "port = 8080" },
    tight = { "<%=port%>", "8080" },
    padded = { "<%=   port   %>", "8080" },
    repeated = { "<%= port %>:<%= port %>", "8080:8080" },
)]
fn substitutes_placeholders(template: &str, expected: &str) {
    let vars = vars(&[("port", "8080")]);
    assert_eq!(render(template, &vars).unwrap(), expected);
}

#[test]
fn renders_multiple_vars() {
    let vars = vars(&[("host", "0.0.0.0"), ("port", "80")]);
    let out = render("listen <%= host %>:<%= port %>;", &vars).unwrap();
    assert_eq!(out, "listen 0.0.0.0:80;");
}

#[test]
fn unknown_var_is_an_error() {
    let vars = vars(&[("port", "8080")]);
    let err = render("<%= port %> <%= missing %>", &vars);
    assert_eq!(err, Err(TemplateError::UnknownVar("missing".to_string())));
}

#[test]
fn text_without_placeholders_is_untouched(){
    let out = render("plain text $1 ${var} {{ x }}", &HashMap::new()).unwrap();
    assert_eq!(out, "plain text $1 ${var} {{ x }}");
}

#[test]
fn rendering_is_deterministic() {
    let vars = vars(&[("a", "1"), ("b", "2")]);
    let template = "<%= a %>-<%= b %>-<%= a %>";
    assert_eq!(render(template, &vars).unwrap(), render(template, &vars).unwrap());
}
