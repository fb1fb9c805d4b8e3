// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur while driving the agent lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Failed to connect agent: {0}")]
    Connect(#[source] WorkerError),

    #[error("Agent run failed: {0}")]
    Run(#[source] WorkerError),

    #[error("Failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
}

/// Errors from the registration call against the coordination service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The service refused the registration outright. Retrying a rejected
    /// credential cannot succeed, so this aborts the retry loop.
    #[error("the coordination service rejected the registration (status {status})")]
    Rejected { status: u16 },

    #[error("registration request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registration returned status {0}")]
    Status(u16),

    #[error("failed to decode registration response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl RegistrationError {
    /// Whether this failure can never succeed on a later attempt.
    pub fn is_permanent(&self) -> bool {
        matches!(self, RegistrationError::Rejected { .. })
    }
}

/// Errors surfaced by a worker lifecycle implementation.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("the coordination service returned status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Errors from a cloud tag lookup. Always non-fatal to the lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("instance metadata request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("instance metadata returned status {0}")]
    Status(u16),
}
