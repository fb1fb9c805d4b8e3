// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bounded fixed-interval retry with a caller-controlled early abort.
//!
//! The engine is policy-free: it does not know what makes a failure
//! permanent. The wrapped operation classifies failures itself by calling
//! [`RetryState::stop`], which ends the loop after the current attempt
//! without burning the remaining retry budget.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retry policy: how many attempts, and how long between them.
///
/// The interval is fixed, not exponential. Attempt 1 runs immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub maximum: u32,
    pub interval: Duration,
}

/// Per-attempt view handed to the wrapped operation.
///
/// The abort flag is shared with the engine, so an operation that owns its
/// state inside a future can still end the loop.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    maximum: u32,
    stopped: Arc<AtomicBool>,
}

impl RetryState {
    /// The current attempt number, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Stop retrying after the current attempt returns. Used by operations
    /// that observe a permanent failure, e.g. a rejected credential.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl fmt::Display for RetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attempt {}/{}", self.attempt, self.maximum)
    }
}

/// Run `operation` until it succeeds, aborts, or the attempt budget runs out.
///
/// Success on any attempt returns immediately. A failing attempt that called
/// [`RetryState::stop`] returns that attempt's error with no further delay.
/// Otherwise the engine sleeps for the configured interval and tries again,
/// returning the last error once `maximum` attempts have failed.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(RetryState) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let stopped = Arc::new(AtomicBool::new(false));
    let maximum = config.maximum.max(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let state = RetryState {
            attempt,
            maximum,
            stopped: Arc::clone(&stopped),
        };

        match operation(state).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if stopped.load(Ordering::SeqCst) {
                    debug!("Attempt {attempt}/{maximum} failed and requested no further retries");
                    return Err(e);
                }
                if attempt >= maximum {
                    return Err(e);
                }
                debug!(
                    "Attempt {attempt}/{maximum} failed, retrying in {:?}",
                    config.interval
                );
                sleep(config.interval).await;
            }
        }
    }
}
