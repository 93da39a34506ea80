// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::http::Method;

use crate::constants::SECURITY_CREDENTIALS_PATH;

/// Verdict on how an inbound request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `GET /{version}/meta-data/iam/security-credentials/...`
    Credential,
    /// Anything else, relayed to the upstream metadata service.
    Other,
}

/// Classifies a request from its method and path alone.
///
/// A request is a credential request when the method is `GET` and the path
/// starts with a single non-empty segment followed by
/// `/meta-data/iam/security-credentials/`. Anything may follow that prefix.
pub fn classify(method: &Method, path: &str) -> RequestKind {
    if method != Method::GET {
        return RequestKind::Other;
    }

    let Some(rest) = path.strip_prefix('/') else {
        return RequestKind::Other;
    };

    match rest.split_once('/') {
        Some((segment, tail))
            if !segment.is_empty() && tail.starts_with(SECURITY_CREDENTIALS_PATH) =>
        {
            RequestKind::Credential
        }
        _ => RequestKind::Other,
    }
}
