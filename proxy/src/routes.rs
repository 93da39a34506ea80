// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Request dispatch for the metadata proxy.
//!
//! Every request lands in [`route`], which classifies it and either serves
//! credentials or relays it upstream:
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/{version}/meta-data/iam/security-credentials/...` | [`serve_credentials`] | Role credentials for the caller |
//! | any | anything else | [`Forwarder::forward`] | Relayed to the upstream metadata service |
//!
//! [`Forwarder::forward`]: crate::proxy::Forwarder::forward

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::AppState;
use crate::classifier::{RequestKind, classify};
use crate::constants::CREDENTIAL_CONTENT_TYPE;
use crate::errors::AppError;
use crate::models::CredentialResponse;

/// Entry point for every inbound request.
#[tracing::instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn route(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    match classify(request.method(), request.uri().path()) {
        RequestKind::Credential => {
            tracing::info!("[proxy] serving IAM credentials request");
            serve_credentials(&state, &remote_addr.to_string())
                .await
                .into_response()
        }
        RequestKind::Other => {
            tracing::info!("[proxy] serving reverse proxy request");
            state.forwarder.forward(request).await.into_response()
        }
    }
}

/// Serves temporary credentials for the role assigned to `origin`.
///
/// # Request Flow
///
/// 1. Resolve the caller's role from its origin address
/// 2. Fetch credentials for that role
/// 3. Build the response, with `LastUpdated` one hour before `Expiration`
/// 4. Serialize and return it with a 200
///
/// # Errors
///
/// - [`AppError::RoleNotFound`] - No role assigned to the origin (404)
/// - [`AppError::CredentialFetchFailed`] - Credentials unavailable for the role (500)
/// - [`AppError::SerializationFailed`] - The response could not be encoded (500)
#[tracing::instrument(skip(state))]
pub async fn serve_credentials(state: &AppState, origin: &str) -> Result<Response, AppError> {
    tracing::debug!("[proxy] fetching IAM role");
    let role = state.registry.resolve_role(origin).await.map_err(|e| {
        tracing::warn!("[proxy] unable to find IAM role for {}: {}", origin, e);
        AppError::RoleNotFound(origin.to_string())
    })?;

    tracing::debug!("[proxy] fetching credentials for role {}", role);
    let credentials = state.credentials.credentials_for(&role).await.map_err(|e| {
        tracing::warn!("[proxy] unable to find credentials for role {}: {}", role, e);
        AppError::CredentialFetchFailed(role.to_string())
    })?;

    let response = CredentialResponse::try_from(&credentials).map_err(|e| {
        tracing::error!("[proxy] unable to build credentials for role {}: {}", role, e);
        e
    })?;
    let body = serde_json::to_vec(&response)?;

    tracing::info!("[proxy] built credentials response for role {}", role);

    Ok((StatusCode::OK, [(CONTENT_TYPE, CREDENTIAL_CONTENT_TYPE)], body).into_response())
}
