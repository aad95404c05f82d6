// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn cancelled_resolves_after_cancel() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());

    let waiter = {
        let token = Arc::clone(&token);
        tokio::spawn(async move { token.cancelled().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn cancelled_returns_immediately_when_already_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    token.cancel();
    tokio::time::timeout(Duration::from_millis(100), token.cancelled())
        .await
        .unwrap();
}

#[tokio::test]
async fn wait_cancelled_pends_without_token() {
    let result =
        tokio::time::timeout(Duration::from_millis(50), wait_cancelled(&None)).await;
    assert!(result.is_err(), "should still be pending");
}
