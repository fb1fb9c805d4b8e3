// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::AgentError;
use crate::retry::RetryConfig;
use std::env;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://agent.fleet-ci.com/v1";
const DEFAULT_REGISTRATION_MAX_ATTEMPTS: u32 = 30;
const DEFAULT_REGISTRATION_RETRY_INTERVAL_SECS: u64 = 1;

/// Configuration for the fleet worker agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the coordination service
    pub endpoint: String,
    /// Registration token for the coordination service
    pub token: String,
    /// Agent name; defaults to the hostname when unset
    pub name: Option<String>,
    /// Scheduling priority reported at registration
    pub priority: Option<String>,
    /// Free-form `key=value` metadata strings
    pub meta_data: Vec<String>,
    /// Whether remote command evaluation is enabled for this agent
    pub command_eval: bool,
    /// Whether to attempt cloud-provider tag enrichment before registering
    pub cloud_tags: bool,
    /// Whether the worker's exit status becomes the process exit code
    pub exit_with_status: bool,
    /// Maximum registration attempts before giving up
    pub registration_max_attempts: u32,
    /// Fixed delay between registration attempts
    pub registration_retry_interval: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            name: None,
            priority: None,
            meta_data: Vec::new(),
            command_eval: true,
            cloud_tags: false,
            exit_with_status: false,
            registration_max_attempts: DEFAULT_REGISTRATION_MAX_ATTEMPTS,
            registration_retry_interval: Duration::from_secs(
                DEFAULT_REGISTRATION_RETRY_INTERVAL_SECS,
            ),
            log_level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, AgentError> {
        let endpoint = env::var("FLEET_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let token = env::var("FLEET_TOKEN").unwrap_or_default();
        let name = env::var("FLEET_NAME").ok().filter(|val| !val.is_empty());
        let priority = env::var("FLEET_PRIORITY").ok().filter(|val| !val.is_empty());
        let meta_data = env::var("FLEET_META_DATA")
            .map(|val| {
                val.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let command_eval = env::var("FLEET_COMMAND_EVAL")
            .map(|val| val.to_lowercase() != "false")
            .unwrap_or(true);
        let cloud_tags = env::var("FLEET_CLOUD_TAGS")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);
        let exit_with_status = env::var("FLEET_EXIT_WITH_STATUS")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);
        let registration_max_attempts = env::var("FLEET_REGISTRATION_MAX_ATTEMPTS")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_REGISTRATION_MAX_ATTEMPTS);
        let registration_retry_interval = env::var("FLEET_REGISTRATION_RETRY_INTERVAL")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REGISTRATION_RETRY_INTERVAL_SECS));
        let log_level = env::var("FLEET_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            endpoint,
            token,
            name,
            priority,
            meta_data,
            command_eval,
            cloud_tags,
            exit_with_status,
            registration_max_attempts,
            registration_retry_interval,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.token.trim().is_empty() {
            return Err(AgentError::InvalidConfig(
                "FLEET_TOKEN must be set".to_string(),
            ));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(AgentError::InvalidConfig(format!(
                "Invalid endpoint '{}'. Must be an http(s) URL",
                self.endpoint
            )));
        }

        if self.registration_max_attempts == 0 {
            return Err(AgentError::InvalidConfig(
                "FLEET_REGISTRATION_MAX_ATTEMPTS must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(AgentError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// The retry policy used for the registration call.
    pub fn registration_retry(&self) -> RetryConfig {
        RetryConfig {
            maximum: self.registration_max_attempts,
            interval: self.registration_retry_interval,
        }
    }
}
