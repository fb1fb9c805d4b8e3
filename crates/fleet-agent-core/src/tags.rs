// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Best-effort cloud tag enrichment.
//!
//! Tag lookup sits behind a capability trait so that non-cloud environments
//! and tests can substitute a no-op. A failed lookup is reported to the
//! caller, which logs it and registers without the extra metadata.

use crate::error::TagError;
use async_trait::async_trait;
use std::time::Duration;

const IMDS_BASE_URL: &str = "http://169.254.169.254";
const IMDS_TOKEN_TTL_SECS: &str = "60";
const IMDS_TIMEOUT: Duration = Duration::from_secs(1);

/// A source of cloud-provider tags for the registration descriptor.
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Fetch the tags as ordered key/value pairs.
    async fn tags(&self) -> Result<Vec<(String, String)>, TagError>;
}

/// Tag source for environments without cloud metadata.
pub struct NoopTagSource;

#[async_trait]
impl TagSource for NoopTagSource {
    async fn tags(&self) -> Result<Vec<(String, String)>, TagError> {
        Ok(Vec::new())
    }
}

/// EC2 instance tags via the instance metadata service (IMDSv2).
pub struct Ec2TagSource {
    client: reqwest::Client,
    base_url: String,
}

impl Ec2TagSource {
    pub fn new() -> Self {
        Self::with_base_url(IMDS_BASE_URL.to_string())
    }

    /// Point the source at a non-default metadata endpoint. Used by tests.
    pub fn with_base_url(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(IMDS_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    async fn session_token(&self) -> Result<String, TagError> {
        let response = self
            .client
            .put(format!("{}/latest/api/token", self.base_url))
            .header("X-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TagError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn metadata(&self, token: &str, path: &str) -> Result<String, TagError> {
        let response = self
            .client
            .get(format!("{}/latest/meta-data/{}", self.base_url, path))
            .header("X-aws-ec2-metadata-token", token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TagError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

impl Default for Ec2TagSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagSource for Ec2TagSource {
    async fn tags(&self) -> Result<Vec<(String, String)>, TagError> {
        let token = self.session_token().await?;

        // The tags/instance listing is one tag key per line.
        let keys = self.metadata(&token, "tags/instance").await?;

        let mut tags = Vec::new();
        for key in keys.lines().map(str::trim).filter(|key| !key.is_empty()) {
            let value = self.metadata(&token, &format!("tags/instance/{key}")).await?;
            tags.push((key.to_string(), value));
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_noop_source_is_empty() {
        assert_eq!(NoopTagSource.tags().await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn test_ec2_source_fetches_instance_tags() {
        let mut server = Server::new_async().await;

        let token_mock = server
            .mock("PUT", "/latest/api/token")
            .match_header("X-aws-ec2-metadata-token-ttl-seconds", "60")
            .with_status(200)
            .with_body("imds-token")
            .create_async()
            .await;
        let keys_mock = server
            .mock("GET", "/latest/meta-data/tags/instance")
            .match_header("X-aws-ec2-metadata-token", "imds-token")
            .with_status(200)
            .with_body("az\nrole\n")
            .create_async()
            .await;
        let az_mock = server
            .mock("GET", "/latest/meta-data/tags/instance/az")
            .with_status(200)
            .with_body("us-east-1a")
            .create_async()
            .await;
        let role_mock = server
            .mock("GET", "/latest/meta-data/tags/instance/role")
            .with_status(200)
            .with_body("builder")
            .create_async()
            .await;

        let source = Ec2TagSource::with_base_url(server.url());
        let tags = source.tags().await.unwrap();

        assert_eq!(
            tags,
            vec![
                ("az".to_string(), "us-east-1a".to_string()),
                ("role".to_string(), "builder".to_string()),
            ]
        );
        token_mock.assert_async().await;
        keys_mock.assert_async().await;
        az_mock.assert_async().await;
        role_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ec2_source_surfaces_metadata_errors() {
        let mut server = Server::new_async().await;

        server
            .mock("PUT", "/latest/api/token")
            .with_status(403)
            .create_async()
            .await;

        let source = Ec2TagSource::with_base_url(server.url());
        let err = source.tags().await.unwrap_err();
        assert!(matches!(err, TagError::Status(403)));
    }
}
