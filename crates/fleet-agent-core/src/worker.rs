// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The worker lifecycle contract and its remote implementation.

use crate::descriptor::RegisteredAgent;
use crate::error::WorkerError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Lifecycle contract of a worker run.
///
/// The orchestrator holds exactly one worker at a time and calls the methods
/// in a fixed order: `connect` once, `start` once (blocking until the run
/// ends), `disconnect` exactly once after `start` returns. `stop` is the only
/// method invoked from a second, concurrent caller: it must be safe to call
/// repeatedly, after natural completion, and while `start` is in flight.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Establish the worker's connection. Called once; not assumed idempotent.
    async fn connect(&self) -> Result<(), WorkerError>;

    /// Run until completion or until a stop request arrives. Blocks the
    /// caller for the entire run.
    async fn start(&self) -> Result<(), WorkerError>;

    /// Request graceful termination of `start`. Fire-and-forget; safe to
    /// call repeatedly and after completion.
    fn stop(&self);

    /// Tear down the connection. Called exactly once after `start` returns,
    /// on success and on error alike.
    async fn disconnect(&self) -> Result<(), WorkerError>;

    /// The run's exit status, readable after `start` returns.
    fn exit_status(&self) -> i32;
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

// Consecutive heartbeat failures tolerated before the run is considered lost.
const HEARTBEAT_FAILURE_LIMIT: u32 = 5;

/// Worker bound to the coordination service with a registered agent's
/// credentials.
///
/// `connect`/`disconnect` announce the agent to the service; `start` idles on
/// a heartbeat loop until stopped. Job polling and execution are layered on
/// separately and are not part of this crate.
pub struct RemoteWorker {
    client: reqwest::Client,
    endpoint: String,
    agent: RegisteredAgent,
    stop_token: CancellationToken,
    exit_status: AtomicI32,
    heartbeat_interval: Duration,
}

impl RemoteWorker {
    pub fn new(endpoint: &str, agent: RegisteredAgent) -> Result<Self, WorkerError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent,
            stop_token: CancellationToken::new(),
            exit_status: AtomicI32::new(0),
            heartbeat_interval: HEARTBEAT_INTERVAL,
        })
    }

    /// The registered agent this worker runs as.
    pub fn agent(&self) -> &RegisteredAgent {
        &self.agent
    }

    async fn post(&self, path: &str) -> Result<(), WorkerError> {
        let response = self
            .client
            .post(format!("{}{}", self.endpoint, path))
            .header(AUTHORIZATION, format!("Token {}", self.agent.access_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Worker for RemoteWorker {
    async fn connect(&self) -> Result<(), WorkerError> {
        self.post("/connect").await
    }

    async fn start(&self) -> Result<(), WorkerError> {
        let mut heartbeat = tokio::time::interval(self.heartbeat_interval);
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                () = self.stop_token.cancelled() => {
                    debug!("Stop requested, leaving the run loop");
                    return Ok(());
                }
                _ = heartbeat.tick() => {
                    match self.post("/heartbeat").await {
                        Ok(()) => consecutive_failures = 0,
                        Err(e) => {
                            consecutive_failures += 1;
                            warn!(
                                "Heartbeat failed ({}/{}): {}",
                                consecutive_failures, HEARTBEAT_FAILURE_LIMIT, e
                            );
                            if consecutive_failures >= HEARTBEAT_FAILURE_LIMIT {
                                self.exit_status.store(1, Ordering::SeqCst);
                                return Err(e);
                            }
                        }
                    }
                }
            }
        }
    }

    fn stop(&self) {
        // Cancelling an already-cancelled token is a no-op, which makes
        // repeated stop requests strictly idempotent.
        self.stop_token.cancel();
    }

    async fn disconnect(&self) -> Result<(), WorkerError> {
        self.post("/disconnect").await
    }

    fn exit_status(&self) -> i32 {
        self.exit_status.load(Ordering::SeqCst)
    }
}
