// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Core library for the fleet worker agent.
//!
//! A fleet worker registers itself with a remote coordination service, then
//! runs until told to stop or until its assigned work finishes. This crate
//! implements the lifecycle around that run: building the registration
//! descriptor, driving the registration call through a bounded retry loop,
//! connecting the worker, watching for termination signals while the worker
//! runs, and tearing everything down in a deterministic order.
//!
//! The library is organized into several key modules:
//! - [`lifecycle`]: the orchestrator sequencing registration through teardown
//! - [`registration`]: the retried registration call against the service
//! - [`retry`]: the bounded fixed-interval retry engine
//! - [`worker`]: the worker lifecycle contract and its remote implementation
//! - [`signals`]: the shutdown coordinator and OS signal wiring
//! - [`tags`]: best-effort cloud metadata enrichment
//! - [`config`]: environment-driven agent configuration

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

/// Environment-driven agent configuration
pub mod config;

/// Registration payload and the registered agent record
pub mod descriptor;

/// Errors for each lifecycle concern
pub mod error;

/// Hostname and OS fingerprint detection
pub mod host;

/// Lifecycle orchestration from registration to teardown
pub mod lifecycle;

/// Registration against the coordination service
pub mod registration;

/// Bounded fixed-interval retry with caller-controlled abort
pub mod retry;

/// Termination signal watching and the shutdown coordinator
pub mod signals;

/// Cloud tag enrichment behind a capability trait
pub mod tags;

/// Worker lifecycle contract
pub mod worker;

/// Version of the agent, reported in the registration descriptor.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::AgentConfig;
pub use descriptor::{AgentDescriptor, RegisteredAgent};
pub use error::{AgentError, RegistrationError, TagError, WorkerError};
pub use lifecycle::Lifecycle;
pub use registration::RegistrationClient;
pub use retry::{RetryConfig, RetryState};
pub use signals::{ShutdownCoordinator, TermSignal};
pub use tags::{Ec2TagSource, NoopTagSource, TagSource};
pub use worker::{RemoteWorker, Worker};
