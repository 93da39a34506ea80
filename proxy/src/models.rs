// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

use aws_sdk_sts::types::Credentials;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, Serializer};
use zeroize::ZeroizeOnDrop;

use crate::constants::{CREDENTIAL_CODE, CREDENTIAL_TYPE, LAST_UPDATED_OFFSET_HOURS};
use crate::errors::{AppError, FetchError};

/// Opaque name of a permission set assigned to a workload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Temporary credentials for a role.
///
/// Every field is mandatory: a store can only report success by producing a
/// complete set, so the responder never has to check for missing values.
#[derive(Clone, ZeroizeOnDrop)]
pub struct CredentialSet {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    #[zeroize(skip)]
    expiration: DateTime<Utc>,
}

impl CredentialSet {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl TryFrom<&Credentials> for CredentialSet {
    type Error = FetchError;

    fn try_from(credentials: &Credentials) -> Result<Self, Self::Error> {
        if credentials.access_key_id().is_empty() {
            return Err(FetchError::Incomplete("access key id"));
        }
        if credentials.secret_access_key().is_empty() {
            return Err(FetchError::Incomplete("secret access key"));
        }
        if credentials.session_token().is_empty() {
            return Err(FetchError::Incomplete("session token"));
        }

        let expiration = credentials.expiration();
        let expiration = DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
            .ok_or(FetchError::Incomplete("expiration"))?;

        Ok(Self::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token(),
            expiration,
        ))
    }
}

/// Body of a successful `security-credentials` response, in the field order
/// and naming the instance metadata service uses.
#[derive(Serialize, ZeroizeOnDrop)]
pub struct CredentialResponse {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,

    #[serde(rename = "Code")]
    #[zeroize(skip)]
    code: &'static str,

    #[serde(rename = "Expiration", serialize_with = "serialize_timestamp")]
    #[zeroize(skip)]
    expiration: DateTime<Utc>,

    #[serde(rename = "LastUpdated", serialize_with = "serialize_timestamp")]
    #[zeroize(skip)]
    last_updated: DateTime<Utc>,

    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,

    #[serde(rename = "Token")]
    token: String,

    #[serde(rename = "Type")]
    #[zeroize(skip)]
    credential_type: &'static str,
}

impl CredentialResponse {
    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

impl TryFrom<&CredentialSet> for CredentialResponse {
    type Error = AppError;

    fn try_from(credentials: &CredentialSet) -> Result<Self, Self::Error> {
        let last_updated = credentials
            .expiration
            .checked_sub_signed(TimeDelta::hours(LAST_UPDATED_OFFSET_HOURS))
            .ok_or(AppError::SerializationFailed)?;

        Ok(Self {
            access_key_id: credentials.access_key_id.clone(),
            code: CREDENTIAL_CODE,
            expiration: credentials.expiration,
            last_updated,
            secret_access_key: credentials.secret_access_key.clone(),
            token: credentials.session_token.clone(),
            credential_type: CREDENTIAL_TYPE,
        })
    }
}

impl fmt::Debug for CredentialResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResponse")
            .field("code", &self.code)
            .field("expiration", &self.expiration)
            .field("last_updated", &self.last_updated)
            .field("type", &self.credential_type)
            .finish_non_exhaustive()
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

/// RFC 3339 in UTC with trailing zeros trimmed from the fractional seconds,
/// e.g. `2026-10-18T12:00:00Z` or `2026-10-18T12:00:00.25Z`.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    let mut formatted = timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = timestamp.timestamp_subsec_nanos();
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        formatted.push('.');
        formatted.push_str(fraction.trim_end_matches('0'));
    }
    formatted.push('Z');
    formatted
}
