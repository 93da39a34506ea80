// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_ROLE_SESSION_NAME, DEFAULT_UPSTREAM_URL};

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ProxyOptions {
    #[arg(long, default_value = "127.0.0.1", env("PROXY_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "8080", env("PROXY_HTTP_PORT"))]
    pub port: u16,
    /// Base URL of the real metadata service
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL, env("PROXY_UPSTREAM_URL"))]
    pub upstream: String,
    /// JSON object mapping origin addresses to role names
    #[arg(long, env("PROXY_ROLES_FILE"))]
    pub roles_file: Option<PathBuf>,
    /// Role served to origins missing from the roles file
    #[arg(long, env("PROXY_DEFAULT_ROLE"))]
    pub default_role: Option<String>,
    /// Region for STS calls, defaults to the AWS region provider chain
    #[arg(long, env("PROXY_STS_REGION"))]
    pub sts_region: Option<String>,
    /// Session name used when assuming container roles
    #[arg(long, default_value = DEFAULT_ROLE_SESSION_NAME, env("PROXY_ROLE_SESSION_NAME"))]
    pub session_name: String,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        ProxyOptions {
            host: "127.0.0.1".to_string(),
            port: 8080,
            upstream: DEFAULT_UPSTREAM_URL.to_string(),
            roles_file: None,
            default_role: None,
            sts_region: None,
            session_name: DEFAULT_ROLE_SESSION_NAME.to_string(),
        }
    }
}
