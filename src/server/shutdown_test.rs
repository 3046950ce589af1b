//! Tests for the stop signal

use super::shutdown::*;
use std::time::Duration;

#[tokio::test]
async fn test_shutdown_channel_initially_not_shutdown() {
    let (_controller, signal) = shutdown_channel();

    assert!(!signal.is_shutdown());
}

#[tokio::test]
async fn test_shutdown_channel_triggers_shutdown() {
    let (controller, signal) = shutdown_channel();

    assert!(!signal.is_shutdown());

    assert!(controller.shutdown());

    assert!(signal.is_shutdown());
}

/// Closing twice neither panics nor reports a second transition
#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let (controller, mut signal) = shutdown_channel();

    assert!(controller.shutdown());
    assert!(!controller.shutdown());
    assert!(!controller.shutdown());

    assert!(signal.is_shutdown());
    let result = tokio::time::timeout(Duration::from_millis(100), signal.wait()).await;
    assert!(result.is_ok(), "wait() must return once closed");
}

#[tokio::test]
async fn test_shutdown_without_receivers_still_closes() {
    let (controller, signal) = shutdown_channel();
    drop(signal);

    assert!(controller.shutdown());
    assert!(controller.subscribe().is_shutdown());
}

#[tokio::test]
async fn test_shutdown_wait_completes_on_signal() {
    let (controller, mut signal) = shutdown_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.shutdown();
    });

    let result = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;

    assert!(
        result.is_ok(),
        "wait() should complete when shutdown triggered"
    );
    assert!(signal.is_shutdown());
}

#[tokio::test]
async fn test_wait_completes_when_controller_dropped() {
    let (controller, mut signal) = shutdown_channel();
    drop(controller);

    let result = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_shutdown_signal_clones_share_state() {
    let (controller, signal) = shutdown_channel();
    let mut waiters = Vec::new();
    for _ in 0..3 {
        let mut s = signal.clone();
        waiters.push(tokio::spawn(async move { s.wait().await }));
    }

    controller.shutdown();

    for waiter in waiters {
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }
    assert!(signal.is_shutdown());
}
