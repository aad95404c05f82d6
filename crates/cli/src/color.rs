// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ANSI color handling
//!
//! Colors are off with `--plain`, with `NO_COLOR` set, or when stdout is
//! not a terminal.

use std::io::IsTerminal;

#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub dim: &'static str,
    pub bold: &'static str,
    pub reset: &'static str,
}

const ENABLED: Colors = Colors {
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    dim: "\x1b[2m",
    bold: "\x1b[1m",
    reset: "\x1b[0m",
};

const DISABLED: Colors = Colors {
    red: "",
    green: "",
    yellow: "",
    dim: "",
    bold: "",
    reset: "",
};

impl Colors {
    pub fn detect(plain: bool) -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if plain || no_color || !std::io::stdout().is_terminal() {
            DISABLED
        } else {
            ENABLED
        }
    }
}
