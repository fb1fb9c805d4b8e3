// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle orchestration from registration to teardown.
//!
//! One strictly ordered control flow:
//!
//! ```text
//! Idle -> Registering -> Registered -> Connecting -> Connected
//!      -> Running (shutdown coordinator armed) -> Disconnecting -> Terminal
//! ```
//!
//! Registration and connect failures are fatal and short-circuit before any
//! worker run begins. A failing run is still fatal, but disconnect always
//! executes first. The orchestrator never terminates the process itself: it
//! returns a tagged outcome and the binary decides the exit code.

use crate::config::AgentConfig;
use crate::descriptor::AgentDescriptor;
use crate::error::AgentError;
use crate::registration::RegistrationClient;
use crate::signals::{self, ShutdownCoordinator, TermSignal};
use crate::tags::{Ec2TagSource, TagSource};
use crate::worker::{RemoteWorker, Worker};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Orchestrates one agent process: register, connect, run, tear down.
pub struct Lifecycle {
    config: AgentConfig,
    registration: RegistrationClient,
    tag_source: Option<Arc<dyn TagSource>>,
}

impl Lifecycle {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;
        let registration = RegistrationClient::new(
            &config.endpoint,
            &config.token,
            config.registration_retry(),
        )?;
        let tag_source: Option<Arc<dyn TagSource>> = if config.cloud_tags {
            Some(Arc::new(Ec2TagSource::new()))
        } else {
            None
        };
        Ok(Self {
            config,
            registration,
            tag_source,
        })
    }

    /// Run the full lifecycle. Returns the process exit code to report on
    /// success; any error is a fatal outcome for the binary to log and turn
    /// into a non-zero exit.
    pub async fn run(&self) -> Result<i32, AgentError> {
        let descriptor = AgentDescriptor::build(&self.config, self.tag_source.as_deref()).await;

        info!("Registering agent with the coordination service...");
        let registered = self.registration.register(&descriptor).await?;
        info!(
            "Successfully registered agent \"{}\" with meta-data {:?}",
            registered.descriptor.name, registered.descriptor.meta_data
        );

        let worker = Arc::new(
            RemoteWorker::new(&self.config.endpoint, registered).map_err(AgentError::Connect)?,
        );
        let signals = signals::os_signals()?;

        run_worker(&self.config, worker, signals).await
    }
}

/// Drive a connected worker through its run and teardown.
///
/// Exposed separately from [`Lifecycle::run`] so the sequencing can be
/// exercised against any [`Worker`] implementation and signal source.
pub async fn run_worker(
    config: &AgentConfig,
    worker: Arc<dyn Worker>,
    signals: mpsc::Receiver<TermSignal>,
) -> Result<i32, AgentError> {
    info!("Connecting to the coordination service...");
    worker.connect().await.map_err(AgentError::Connect)?;
    info!("Agent successfully connected");

    // The coordinator is armed only now that a connected handle exists, and
    // before the blocking run starts, so no signal can race an absent handle.
    let coordinator = ShutdownCoordinator::spawn(signals, Arc::clone(&worker));

    info!("Waiting for work...");
    let run_result = worker.start().await;

    coordinator.shutdown().await;

    info!("Disconnecting...");
    if let Err(e) = worker.disconnect().await {
        // A failed teardown never changes an already-determined outcome.
        warn!("Failed to disconnect cleanly: {}", e);
    }

    run_result.map_err(AgentError::Run)?;

    if config.exit_with_status {
        Ok(worker.exit_status())
    } else {
        Ok(0)
    }
}
