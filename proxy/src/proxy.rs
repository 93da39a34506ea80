// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Single-target reverse proxy to the upstream metadata service.
//!
//! Requests are relayed with only the changes any HTTP/1.1 proxy has to make:
//!
//! - the URI is re-targeted at the upstream scheme and authority, with the
//!   upstream's base path prefixed and both query strings kept
//! - the inbound `Host` header is dropped so the client sends the upstream's
//! - hop-by-hop headers are removed in both directions
//!
//! The upstream response is streamed back with its status, headers and body
//! untouched.

use axum::body::Body;
use axum::http::header::{CONNECTION, HOST};
use axum::http::uri::{PathAndQuery, Scheme};
use axum::http::{HeaderMap, HeaderName, Request, Uri};
use axum::response::Response;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::constants::HOP_BY_HOP_HEADERS;
use crate::errors::AppError;

#[derive(Clone)]
pub struct Forwarder {
    upstream: Uri,
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    /// Creates a forwarder for a plain `http://` upstream.
    pub fn new(upstream: Uri) -> Result<Self, AppError> {
        if upstream.scheme() != Some(&Scheme::HTTP) {
            return Err(AppError::ConfigError(format!(
                "upstream must be an http:// URL: {upstream}"
            )));
        }
        if upstream.authority().is_none() {
            return Err(AppError::ConfigError(format!(
                "upstream is missing a host: {upstream}"
            )));
        }

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self { upstream, client })
    }

    pub fn upstream(&self) -> &Uri {
        &self.upstream
    }

    #[tracing::instrument(skip(self, request), fields(method = %request.method(), path = %request.uri().path()))]
    pub async fn forward(&self, request: Request<Body>) -> Result<Response, AppError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = self.target_uri(&parts.uri)?;
        parts.headers.remove(HOST);
        remove_hop_by_hop_headers(&mut parts.headers);

        tracing::debug!("[proxy] forwarding to {}", parts.uri);

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| {
                tracing::error!("[proxy] upstream request failed: {:?}", e);
                AppError::UpstreamUnavailable
            })?;

        let (mut parts, body) = response.into_parts();
        remove_hop_by_hop_headers(&mut parts.headers);

        tracing::debug!("[proxy] upstream responded with {}", parts.status);

        Ok(Response::from_parts(parts, Body::new(body)))
    }

    fn target_uri(&self, uri: &Uri) -> Result<Uri, AppError> {
        let path = join_paths(self.upstream.path(), uri.path());
        let path_and_query = match (self.upstream.query(), uri.query()) {
            (Some(base), Some(query)) => format!("{path}?{base}&{query}"),
            (Some(query), None) | (None, Some(query)) => format!("{path}?{query}"),
            (None, None) => path,
        };
        let path_and_query = PathAndQuery::try_from(path_and_query).map_err(|e| {
            tracing::error!("[proxy] unable to build upstream path: {:?}", e);
            AppError::UpstreamUnavailable
        })?;

        let mut parts = self.upstream.clone().into_parts();
        parts.path_and_query = Some(path_and_query);
        Uri::from_parts(parts).map_err(|e| {
            tracing::error!("[proxy] unable to build upstream uri: {:?}", e);
            AppError::UpstreamUnavailable
        })
    }
}

/// Joins a base path and a request path with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

fn remove_hop_by_hop_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}
