// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Role assignment for request origins.
//!
//! The proxy only depends on the [`RoleRegistry`] trait. [`StaticRoleRegistry`]
//! is the implementation wired up by the binary: a fixed origin to role table
//! loaded from a JSON file at startup.
//!
//! ```json
//! {
//!   "172.17.0.2": "deploy-role",
//!   "172.17.0.3": "reporting-role"
//! }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::errors::RoleNotFound;
use crate::models::Role;

/// Resolves the role assigned to a network origin.
#[async_trait]
pub trait RoleRegistry: Send + Sync {
    /// `origin` is the raw peer address of the connection, typically `ip:port`.
    async fn resolve_role(&self, origin: &str) -> Result<Role, RoleNotFound>;
}

#[derive(Debug, Default, Clone)]
pub struct StaticRoleRegistry {
    roles: HashMap<String, Role>,
    default_role: Option<Role>,
}

impl StaticRoleRegistry {
    pub fn new(roles: HashMap<String, Role>, default_role: Option<Role>) -> Self {
        Self {
            roles,
            default_role,
        }
    }

    /// Loads the origin to role table from a JSON object file.
    pub async fn from_file(path: &Path, default_role: Option<Role>) -> Result<Self> {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read roles file {}", path.display()))?;
        let roles: HashMap<String, Role> = serde_json::from_slice(&contents)
            .with_context(|| format!("failed to parse roles file {}", path.display()))?;

        tracing::info!(
            "[proxy] loaded {} role assignments from {}",
            roles.len(),
            path.display()
        );

        Ok(Self::new(roles, default_role))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    fn lookup(&self, origin: &str) -> Option<&Role> {
        if let Some(role) = self.roles.get(origin) {
            return Some(role);
        }

        // peer addresses carry the client's ephemeral port
        origin
            .parse::<SocketAddr>()
            .ok()
            .and_then(|address| self.roles.get(&address.ip().to_string()))
    }
}

#[async_trait]
impl RoleRegistry for StaticRoleRegistry {
    async fn resolve_role(&self, origin: &str) -> Result<Role, RoleNotFound> {
        self.lookup(origin)
            .or(self.default_role.as_ref())
            .cloned()
            .ok_or_else(|| RoleNotFound {
                origin: origin.to_string(),
            })
    }
}
