// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::env;
use std::process::ExitCode;

use fleet_agent_core::{AgentConfig, Lifecycle, AGENT_VERSION};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> ExitCode {
    let log_level = env::var("FLEET_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    show_banner(&config);

    let lifecycle = match Lifecycle::new(config) {
        Ok(lifecycle) => lifecycle,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match lifecycle.run().await {
        Ok(exit_status) => {
            info!("Agent finished with exit status {exit_status}");
            ExitCode::from(u8::try_from(exit_status).unwrap_or(1))
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Log the welcome lines and the configuration options used for this run.
fn show_banner(config: &AgentConfig) {
    info!(
        "Starting fleet-agent v{} with PID: {}",
        AGENT_VERSION,
        std::process::id()
    );
    info!("Send SIGQUIT to stop the agent gracefully");
    info!("Endpoint: {}", config.endpoint);

    if let Some(name) = &config.name {
        debug!("Agent name: {name}");
    }
    if let Some(priority) = &config.priority {
        debug!("Agent priority: {priority}");
    }
    if !config.meta_data.is_empty() {
        debug!("Meta-data: {:?}", config.meta_data);
    }
    if !config.command_eval {
        debug!("Evaluating console commands has been disabled");
    }
    if config.cloud_tags {
        debug!("Cloud tag enrichment is enabled");
    }
    if config.exit_with_status {
        debug!("The worker's exit status will become the process exit code");
    }
}
