// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Registration against the coordination service.
//!
//! Registration is the one retried step of the lifecycle: a bounded policy
//! keeps the worker alive through a brief control-plane blip without hanging
//! startup forever. An authorization rejection aborts the loop immediately;
//! retrying a bad credential cannot succeed.

use crate::descriptor::{AgentDescriptor, RegisteredAgent};
use crate::error::RegistrationError;
use crate::retry::{retry, RetryConfig};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the registration endpoint of the coordination service.
pub struct RegistrationClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    retry: RetryConfig,
}

impl RegistrationClient {
    pub fn new(
        endpoint: &str,
        token: &str,
        retry: RetryConfig,
    ) -> Result<Self, RegistrationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retry,
        })
    }

    /// Register the agent, retrying transient failures up to the configured
    /// maximum. Either a [`RegisteredAgent`] comes back or startup fails;
    /// there is no partial-success state.
    pub async fn register(
        &self,
        descriptor: &AgentDescriptor,
    ) -> Result<RegisteredAgent, RegistrationError> {
        retry(&self.retry, |state| async move {
            match self.attempt(descriptor).await {
                Ok(registered) => Ok(registered),
                Err(e) => {
                    if e.is_permanent() {
                        warn!("The coordination service rejected the registration ({})", e);
                        state.stop();
                    } else {
                        warn!("{} ({})", e, state);
                    }
                    Err(e)
                }
            }
        })
        .await
    }

    async fn attempt(
        &self,
        descriptor: &AgentDescriptor,
    ) -> Result<RegisteredAgent, RegistrationError> {
        let response = self
            .client
            .post(format!("{}/register", self.endpoint))
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .json(descriptor)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RegistrationError::Rejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(RegistrationError::Status(status.as_u16()));
        }

        response
            .json::<RegisteredAgent>()
            .await
            .map_err(RegistrationError::Decode)
    }
}
