// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

/// Path that follows the version segment of a credentials request,
/// e.g. `/latest/meta-data/iam/security-credentials/my-role`.
pub const SECURITY_CREDENTIALS_PATH: &str = "meta-data/iam/security-credentials/";
pub const CREDENTIAL_CODE: &str = "Success";
pub const CREDENTIAL_TYPE: &str = "AWS-HMAC";
/// `LastUpdated` is always reported as this many hours before `Expiration`.
pub const LAST_UPDATED_OFFSET_HOURS: i64 = 1;
pub const CREDENTIAL_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub const DEFAULT_UPSTREAM_URL: &str = "http://169.254.169.254";
pub const DEFAULT_ROLE_SESSION_NAME: &str = "metadata-proxy";
pub const DEFAULT_STS_REGION: &str = "us-east-1";
/// One hour, so `Expiration - 1h` lines up with when the role was assumed.
pub const ASSUME_ROLE_DURATION_SECONDS: i32 = 3600;
pub const CREDENTIAL_REFRESH_BUFFER: Duration = Duration::from_secs(60); // refresh 60s before expiry

/// Headers that only apply to a single transport hop and are never forwarded.
/// https://www.rfc-editor.org/rfc/rfc9110#section-7.6.1
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];
