// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Uri;
use clap::Parser;
use metadata_proxy::application::{AppState, Application};
use metadata_proxy::cache::CredentialCache;
use metadata_proxy::configuration::ProxyOptions;
use metadata_proxy::models::Role;
use metadata_proxy::proxy::Forwarder;
use metadata_proxy::registry::StaticRoleRegistry;
use metadata_proxy::sts::StsCredentialSource;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // span fields are already attached to each event
        .with_current_span(false)
        .with_ansi(false)
        .with_target(false)
        .init();

    let options = ProxyOptions::parse();

    tracing::info!("[proxy] {:?}", &options);

    let upstream: Uri = options
        .upstream
        .parse()
        .with_context(|| format!("invalid upstream URL {}", options.upstream))?;
    let forwarder = Forwarder::new(upstream)?;

    let default_role = options.default_role.as_deref().map(Role::from);
    let registry = match &options.roles_file {
        Some(path) => StaticRoleRegistry::from_file(path, default_role).await?,
        None => StaticRoleRegistry::new(HashMap::new(), default_role),
    };
    if registry.is_empty() {
        tracing::warn!("[proxy] no role assignments configured");
    }

    let source =
        StsCredentialSource::from_env(options.sts_region.clone(), options.session_name.as_str())
            .await;
    let credentials = CredentialCache::new(source);

    let state = AppState {
        registry: Arc::new(registry),
        credentials: Arc::new(credentials),
        forwarder,
    };

    let application = Application::build(&options, state).await?;

    application.run_until_stopped().await?;

    Ok(())
}
