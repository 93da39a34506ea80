// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Metadata Proxy
//!
//! An instance metadata service proxy for containerized workloads.
//!
//! Containers on a host are pointed at this proxy instead of the real metadata
//! service. Requests for IAM security credentials are answered with
//! credentials for the role assigned to the calling container; everything
//! else is relayed to the real service unchanged.
//!
//! ## Architecture
//!
//! ```text
//! Container -> HTTP -> Proxy (this crate) -+-> role registry -> credential cache -> STS
//!                                          |
//!                                          +-> IMDS (passthrough)
//! ```
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum and graceful shutdown
//! - [`cache`]: Per-role credential caching in front of a credential source
//! - [`classifier`]: Decides whether a request is a credentials request
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Configuration constants for the application
//! - [`errors`]: Error types with HTTP status mapping
//! - [`models`]: Roles, credential sets and the credentials response body
//! - [`proxy`]: Reverse proxy to the upstream metadata service
//! - [`registry`]: Origin to role assignment
//! - [`routes`]: Request dispatch and the credentials handler
//! - [`store`]: Credential store and source interfaces
//! - [`sts`]: Role credentials from AWS STS AssumeRole
//!
//! ## Usage
//!
//! ```bash
//! metadata-proxy --host 0.0.0.0 --port 8080 --roles-file /etc/metadata-proxy/roles.json
//! ```

pub mod application;
pub mod cache;
pub mod classifier;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod models;
pub mod proxy;
pub mod registry;
pub mod routes;
pub mod store;
pub mod sts;
