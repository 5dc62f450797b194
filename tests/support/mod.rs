//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::time::Duration;

pub mod scripted;
#[cfg(feature = "http")]
pub mod server;
pub mod student;

/// Poll `condition` until it holds, panicking after about a second.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
