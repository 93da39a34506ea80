// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Role credentials issued by AWS STS.
//!
//! The proxy assumes each container's role with the host's own credentials
//! (resolved through the default provider chain, normally the instance
//! profile). Roles are therefore expected to be role ARNs, e.g.
//! `arn:aws:iam::123456789012:role/deploy-role`, and the instance role must
//! be allowed to assume them.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::Client as StsClient;
use aws_sdk_sts::error::DisplayErrorContext;

use crate::constants::{ASSUME_ROLE_DURATION_SECONDS, DEFAULT_STS_REGION};
use crate::errors::FetchError;
use crate::models::{CredentialSet, Role};
use crate::store::CredentialSource;

pub struct StsCredentialSource {
    client: StsClient,
    session_name: String,
}

impl StsCredentialSource {
    pub fn new(client: StsClient, session_name: impl Into<String>) -> Self {
        Self {
            client,
            session_name: session_name.into(),
        }
    }

    /// Builds an STS client from the default credential and region chain.
    ///
    /// Region priority: `region` argument -> ENV vars -> config file -> EC2
    /// metadata -> [`DEFAULT_STS_REGION`].
    pub async fn from_env(region: Option<String>, session_name: impl Into<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let mut config = loader.load().await;

        if config.region().is_none() {
            tracing::info!(
                "[proxy] no region configured, using default {} for STS",
                DEFAULT_STS_REGION
            );
            config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(DEFAULT_STS_REGION))
                .load()
                .await;
        }

        tracing::info!("[proxy] using STS region {:?}", config.region());

        Self::new(StsClient::new(&config), session_name)
    }
}

#[async_trait]
impl CredentialSource for StsCredentialSource {
    async fn fetch(&self, role: &Role) -> Result<CredentialSet, FetchError> {
        tracing::debug!("[proxy] calling STS AssumeRole for {}", role);

        let response = self
            .client
            .assume_role()
            .role_arn(role.as_str())
            .role_session_name(&self.session_name)
            .duration_seconds(ASSUME_ROLE_DURATION_SECONDS)
            .send()
            .await
            .map_err(|e| FetchError::AssumeRole(DisplayErrorContext(&e).to_string()))?;

        let credentials = response
            .credentials()
            .ok_or(FetchError::Incomplete("credentials"))?;

        CredentialSet::try_from(credentials)
    }
}
