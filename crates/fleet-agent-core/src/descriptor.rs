// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The registration payload and the record the service returns for it.

use crate::config::AgentConfig;
use crate::host;
use crate::tags::TagSource;
use crate::AGENT_VERSION;
use serde::{Deserialize, Serialize};
use tracing::error;

/// The registration payload describing this agent.
///
/// Built once before registration; the same descriptor is resent on every
/// retry attempt. The only mutation it ever sees is the best-effort append
/// of cloud tags during [`AgentDescriptor::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Ordered free-form `key=value` metadata strings
    pub meta_data: Vec<String>,
    /// Whether remote command evaluation is enabled
    pub command_eval_enabled: bool,
    pub version: String,
    pub pid: u32,
    pub hostname: String,
    pub os: String,
}

impl AgentDescriptor {
    /// Assemble the descriptor from configuration and host introspection.
    ///
    /// When a tag source is supplied its tags are appended as `key=value`
    /// metadata. A tag lookup failure is logged and otherwise ignored;
    /// enrichment never blocks registration.
    pub async fn build(config: &AgentConfig, tag_source: Option<&dyn TagSource>) -> Self {
        let hostname = host::hostname();
        let name = config.name.clone().unwrap_or_else(|| hostname.clone());

        let mut meta_data = config.meta_data.clone();
        if let Some(source) = tag_source {
            match source.tags().await {
                Ok(tags) => {
                    for (key, value) in tags {
                        meta_data.push(format!("{key}={value}"));
                    }
                }
                Err(e) => {
                    error!("Failed to fetch cloud tags: {}", e);
                }
            }
        }

        AgentDescriptor {
            name,
            priority: config.priority.clone(),
            meta_data,
            command_eval_enabled: config.command_eval,
            version: AGENT_VERSION.to_string(),
            pid: std::process::id(),
            hostname,
            os: host::os_fingerprint(),
        }
    }
}

/// The service's response to a successful registration: the confirmed
/// descriptor plus the access token used for all subsequent calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredAgent {
    #[serde(flatten)]
    pub descriptor: AgentDescriptor,
    pub access_token: String,
}
