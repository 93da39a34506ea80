// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::constants;
use crate::errors::FetchError;
use crate::models::{CredentialSet, Role};
use crate::store::{CredentialSource, CredentialStore};

/// Caches each role's credentials until shortly before they expire.
///
/// The cache map is only locked to read or insert entries, never while a
/// fetch is in flight. Concurrent misses for the same role wait on that
/// role's refresh lock so the source is called once; other roles are not
/// affected.
pub struct CredentialCache<S> {
    source: S,
    cached: RwLock<HashMap<Role, CredentialSet>>,
    refreshing: Mutex<HashMap<Role, Arc<Mutex<()>>>>,
}

impl<S: CredentialSource> CredentialCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: RwLock::new(HashMap::new()),
            refreshing: Mutex::new(HashMap::new()),
        }
    }

    async fn cached(&self, role: &Role) -> Option<CredentialSet> {
        let cache = self.cached.read().await;
        cache
            .get(role)
            .filter(|cached| is_valid(cached, SystemTime::now()))
            .cloned()
    }

    async fn refresh(&self, role: &Role) -> Result<CredentialSet, FetchError> {
        let refresh_lock = {
            let mut refreshing = self.refreshing.lock().await;
            refreshing.entry(role.clone()).or_default().clone()
        };
        let _guard = refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        if let Some(cached) = self.cached(role).await {
            return Ok(cached);
        }

        let credential = self.source.fetch(role).await?;

        tracing::debug!(
            "[proxy] refreshed credentials for {}, expires_at: {:?}",
            role,
            credential.expiration()
        );

        self.cached
            .write()
            .await
            .insert(role.clone(), credential.clone());

        Ok(credential)
    }
}

#[async_trait]
impl<S: CredentialSource> CredentialStore for CredentialCache<S> {
    /// Returns cached credentials if valid, otherwise fetches fresh ones
    async fn credentials_for(&self, role: &Role) -> Result<CredentialSet, FetchError> {
        if let Some(cached) = self.cached(role).await {
            return Ok(cached);
        }

        self.refresh(role).await
    }
}

/// Valid if now + buffer < expiration
fn is_valid(credential: &CredentialSet, now: SystemTime) -> bool {
    let expires_at = SystemTime::from(credential.expiration());
    now.checked_add(constants::CREDENTIAL_REFRESH_BUFFER)
        .map(|threshold| threshold < expires_at)
        .unwrap_or(false)
}
