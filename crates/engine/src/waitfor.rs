// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wait_for` probes
//!
//! Polls a target at a fixed interval until it matches or the deadline
//! passes. HTTP and TCP probe from the control machine; command probes run
//! on the step's host.

use nexus_adapters::{Connection, ExecError};
use nexus_core::{WaitForKind, WaitForSpec};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Per-attempt bound so one hung probe cannot eat the whole deadline.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("wait_for {target} timed out after {timeout_ms} ms")]
    TimedOut { target: String, timeout_ms: u64 },
    #[error("wait_for cancelled")]
    Cancelled,
}

/// Does the body satisfy `expected_body`? Regex when it parses as one,
/// substring otherwise.
pub fn body_matches(body: &str, expected: &str) -> bool {
    match regex::Regex::new(expected) {
        Ok(re) => re.is_match(body),
        Err(_) => body.contains(expected),
    }
}

async fn http_probe(spec: &WaitForSpec) -> bool {
    let client = match reqwest::Client::builder().timeout(ATTEMPT_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };
    let response = match client.get(&spec.target).send().await {
        Ok(response) => response,
        Err(_) => return false,
    };

    let status = response.status();
    let status_ok = match spec.expected_status {
        Some(expected) => status.as_u16() == expected,
        None => status.is_success(),
    };
    if !status_ok {
        return false;
    }

    if let Some(expected) = &spec.expected_body {
        let body = match response.text().await {
            Ok(body) => body,
            Err(_) => return false,
        };
        return body_matches(&body, expected);
    }
    true
}

async fn tcp_probe(target: &str) -> bool {
    matches!(
        tokio::time::timeout(ATTEMPT_TIMEOUT, tokio::net::TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}

async fn command_probe(target: &str, conn: &dyn Connection) -> Result<bool, WaitError> {
    match conn
        .exec(target, &HashMap::new(), ATTEMPT_TIMEOUT, false)
        .await
    {
        Ok(out) => Ok(out.success()),
        Err(ExecError::Cancelled) => Err(WaitError::Cancelled),
        // Probe errors (timeout, channel hiccup) count as a failed attempt.
        Err(_) => Ok(false),
    }
}

/// Poll until the target matches or `timeout_ms` elapses.
pub async fn wait_for(spec: &WaitForSpec, conn: &dyn Connection) -> Result<(), WaitError> {
    let deadline = Instant::now() + Duration::from_millis(spec.timeout_ms);
    let interval = Duration::from_millis(spec.interval_ms.max(10));

    loop {
        let passed = match spec.kind {
            WaitForKind::Http => http_probe(spec).await,
            WaitForKind::Tcp => tcp_probe(&spec.target).await,
            WaitForKind::Command => command_probe(&spec.target, conn).await?,
        };
        if passed {
            return Ok(());
        }
        if Instant::now() + interval > deadline {
            return Err(WaitError::TimedOut {
                target: spec.target.clone(),
                timeout_ms: spec.timeout_ms,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
#[path = "waitfor_tests.rs"]
mod tests;
