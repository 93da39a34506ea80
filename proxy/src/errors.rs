// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced to HTTP callers.
///
/// Every variant renders as a bare status code with an empty body, matching
/// the metadata service's minimal-disclosure convention.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("no role found for origin {0}")]
    RoleNotFound(String),
    #[error("unable to fetch credentials for role {0}")]
    CredentialFetchFailed(String),
    #[error("unable to serialize credentials")]
    SerializationFailed,
    #[error("upstream request failed")]
    UpstreamUnavailable,
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RoleNotFound(_) => StatusCode::NOT_FOUND,
            Self::CredentialFetchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SerializationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(_source: serde_json::Error) -> Self {
        tracing::error!("{:?}", _source);
        AppError::SerializationFailed
    }
}

/// Returned by a [`RoleRegistry`](crate::registry::RoleRegistry) when no role
/// is assigned to an origin.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("no role assigned to {origin}")]
pub struct RoleNotFound {
    pub origin: String,
}

/// Returned by a [`CredentialStore`](crate::store::CredentialStore) when the
/// credentials for a role are unavailable.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("unable to assume role: {0}")]
    AssumeRole(String),
    #[error("credentials are missing {0}")]
    Incomplete(&'static str),
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}
