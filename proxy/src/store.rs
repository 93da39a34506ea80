// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{CredentialSet, Role};

/// Source of temporary credentials for a role.
///
/// Implementations are shared across all in-flight requests.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credentials_for(&self, role: &Role) -> Result<CredentialSet, FetchError>;
}

/// Issues fresh credentials for a role on every call, with no caching.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch(&self, role: &Role) -> Result<CredentialSet, FetchError>;
}
