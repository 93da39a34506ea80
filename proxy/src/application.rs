// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::configuration::ProxyOptions;
use crate::proxy::Forwarder;
use crate::registry::RoleRegistry;
use crate::routes;
use crate::store::CredentialStore;

/// Immutable per-process state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn RoleRegistry>,
    pub credentials: Arc<dyn CredentialStore>,
    pub forwarder: Forwarder,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(options: &ProxyOptions, state: AppState) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            "[proxy] listening at http://{}:{}, upstream {}",
            options.host,
            port,
            state.forwarder.upstream()
        );

        Ok(Self {
            port,
            listener,
            router: create_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

/// Builds the router. Every method and path goes through [`routes::route`],
/// which needs the peer address as `ConnectInfo<SocketAddr>`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(routes::route)
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("[proxy] shutdown signal received"),
        Err(e) => {
            tracing::error!("[proxy] unable to listen for shutdown signal: {:?}", e);
            std::future::pending::<()>().await;
        }
    }
}
