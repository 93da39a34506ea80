// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP integration tests for the metadata proxy.
//!
//! These tests use `axum-test` to drive the full router. The caller's address
//! is injected with `MockConnectInfo`, the role registry and credential store
//! are counting fakes, and passthrough traffic goes to a real upstream server
//! bound to a random local port.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use metadata_proxy::application::{AppState, create_router};
use metadata_proxy::errors::{FetchError, RoleNotFound};
use metadata_proxy::models::{CredentialSet, Role};
use metadata_proxy::proxy::Forwarder;
use metadata_proxy::registry::RoleRegistry;
use metadata_proxy::store::CredentialStore;
use tokio::net::TcpListener;

const CALLER: &str = "172.17.0.2:41234";
const CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/deploy-role";
const TOKEN_HEADER: &str = "x-aws-ec2-metadata-token";

/// Registry that assigns one role to one exact origin and records lookups.
#[derive(Default)]
struct FakeRegistry {
    assignment: Option<(String, Role)>,
    calls: AtomicUsize,
    origins: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl RoleRegistry for FakeRegistry {
    async fn resolve_role(&self, origin: &str) -> Result<Role, RoleNotFound> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.origins.lock().unwrap().push(origin.to_string());
        match &self.assignment {
            Some((assigned, role)) if assigned == origin => Ok(role.clone()),
            _ => Err(RoleNotFound {
                origin: origin.to_string(),
            }),
        }
    }
}

/// Store that returns fixed credentials (or fails) and records lookups.
#[derive(Default)]
struct FakeStore {
    credentials: Option<CredentialSet>,
    calls: AtomicUsize,
}

#[async_trait]
impl CredentialStore for FakeStore {
    async fn credentials_for(&self, _role: &Role) -> Result<CredentialSet, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .clone()
            .ok_or_else(|| FetchError::Unavailable("no credentials".to_string()))
    }
}

fn expiration() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn assigned_registry() -> Arc<FakeRegistry> {
    Arc::new(FakeRegistry {
        assignment: Some((CALLER.to_string(), Role::from("deploy-role"))),
        ..Default::default()
    })
}

fn working_store() -> Arc<FakeStore> {
    Arc::new(FakeStore {
        credentials: Some(CredentialSet::new(
            "AKIDEXAMPLE",
            "secret",
            "tok",
            expiration(),
        )),
        ..Default::default()
    })
}

/// Starts a stand-in metadata service and returns its base URL.
async fn spawn_upstream() -> String {
    async fn document() -> impl IntoResponse {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::HeaderName::from_static("x-upstream"), "imds"),
            ],
            r#"{"region":"us-east-1","instanceId":"i-0123456789abcdef0"}"#,
        )
    }

    async fn echo_host(headers: HeaderMap) -> String {
        headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn upstream_credentials() -> impl IntoResponse {
        (StatusCode::METHOD_NOT_ALLOWED, "upstream")
    }

    // Reports what arrived in response headers and returns the body as received.
    async fn echo_request(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
        let mut response = body.into_response();
        let echoed = response.headers_mut();
        echoed.insert("x-echo-method", HeaderValue::from_str(method.as_str()).unwrap());
        echoed.insert(
            "x-echo-query",
            HeaderValue::from_str(uri.query().unwrap_or_default()).unwrap(),
        );
        if let Some(token) = headers.get(TOKEN_HEADER) {
            echoed.insert("x-echo-token", token.clone());
        }
        response
    }

    let app = Router::new()
        .route("/latest/dynamic/instance-identity/document", get(document))
        .route("/latest/meta-data/local-hostname", get(echo_host))
        .route(
            "/latest/meta-data/iam/security-credentials/{role}",
            any(upstream_credentials),
        )
        .route("/latest/api/echo", any(echo_request));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{address}")
}

/// Returns an upstream URL nothing is listening on.
async fn unreachable_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}")
}

fn create_test_server(
    upstream: &str,
    registry: Arc<FakeRegistry>,
    store: Arc<FakeStore>,
) -> TestServer {
    let state = AppState {
        registry,
        credentials: store,
        forwarder: Forwarder::new(upstream.parse().unwrap()).unwrap(),
    };
    let caller: SocketAddr = CALLER.parse().unwrap();
    let app = create_router(state).layer(MockConnectInfo(caller));
    TestServer::new(app).unwrap()
}

// =============================================================================
// Credential Requests
// =============================================================================

/// An assigned caller gets its role's credentials in the seven-field body.
#[tokio::test]
async fn test_credentials_for_assigned_role() {
    let upstream = unreachable_upstream().await;
    let server = create_test_server(&upstream, assigned_registry(), working_store());

    let response = server.get(CREDENTIALS_PATH).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["AccessKeyId"], "AKIDEXAMPLE");
    assert_eq!(body["Code"], "Success");
    assert_eq!(body["Expiration"], "2026-10-18T12:00:00Z");
    assert_eq!(body["LastUpdated"], "2026-10-18T11:00:00Z");
    assert_eq!(body["SecretAccessKey"], "secret");
    assert_eq!(body["Token"], "tok");
    assert_eq!(body["Type"], "AWS-HMAC");
    assert_eq!(body.as_object().unwrap().len(), 7);
}

/// `LastUpdated` is exactly one hour before `Expiration`.
#[tokio::test]
async fn test_last_updated_is_one_hour_before_expiration() {
    let upstream = unreachable_upstream().await;
    let server = create_test_server(&upstream, assigned_registry(), working_store());

    let body: serde_json::Value = server.get(CREDENTIALS_PATH).await.json();
    let expiration = DateTime::parse_from_rfc3339(body["Expiration"].as_str().unwrap()).unwrap();
    let last_updated = DateTime::parse_from_rfc3339(body["LastUpdated"].as_str().unwrap()).unwrap();
    assert_eq!(expiration - last_updated, chrono::TimeDelta::hours(1));
}

/// The registry sees the caller's `ip:port` exactly as the connection reported it.
#[tokio::test]
async fn test_origin_is_passed_to_registry_unmodified() {
    let upstream = unreachable_upstream().await;
    let registry = assigned_registry();
    let server = create_test_server(&upstream, registry.clone(), working_store());

    server.get(CREDENTIALS_PATH).await.assert_status_ok();

    assert_eq!(*registry.origins.lock().unwrap(), vec![CALLER.to_string()]);
}

/// One credentials request means one role lookup and one credential lookup.
#[tokio::test]
async fn test_each_credential_request_looks_up_once() {
    let upstream = unreachable_upstream().await;
    let registry = assigned_registry();
    let store = working_store();
    let server = create_test_server(&upstream, registry.clone(), store.clone());

    server.get(CREDENTIALS_PATH).await.assert_status_ok();

    assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

/// Unchanged credentials serialize to the same bytes every time.
#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let upstream = unreachable_upstream().await;
    let server = create_test_server(&upstream, assigned_registry(), working_store());

    let first = server.get(CREDENTIALS_PATH).await;
    let second = server.get(CREDENTIALS_PATH).await;
    assert_eq!(first.as_bytes(), second.as_bytes());
}

/// A caller with no role gets an empty 404 and the store is never asked.
#[tokio::test]
async fn test_unassigned_origin_returns_404_without_credential_lookup() {
    let upstream = unreachable_upstream().await;
    let registry = Arc::new(FakeRegistry::default());
    let store = working_store();
    let server = create_test_server(&upstream, registry.clone(), store.clone());

    let response = server.get(CREDENTIALS_PATH).await;
    response.assert_status_not_found();
    assert!(response.as_bytes().is_empty());

    assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

/// A failed credential lookup becomes an empty 500.
#[tokio::test]
async fn test_unavailable_credentials_return_500() {
    let upstream = unreachable_upstream().await;
    let store = Arc::new(FakeStore::default());
    let server = create_test_server(&upstream, assigned_registry(), store.clone());

    let response = server.get(CREDENTIALS_PATH).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.as_bytes().is_empty());
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

/// An expiration with no representable `LastUpdated` becomes an empty 500.
#[tokio::test]
async fn test_unrepresentable_expiration_returns_500() {
    let upstream = unreachable_upstream().await;
    let store = Arc::new(FakeStore {
        credentials: Some(CredentialSet::new(
            "AKIDEXAMPLE",
            "secret",
            "tok",
            DateTime::<Utc>::MIN_UTC,
        )),
        ..Default::default()
    });
    let server = create_test_server(&upstream, assigned_registry(), store);

    let response = server.get(CREDENTIALS_PATH).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.as_bytes().is_empty());
}

// =============================================================================
// Passthrough Requests
// =============================================================================

/// Non-credential paths come back from the upstream unchanged.
#[tokio::test]
async fn test_other_paths_are_relayed_verbatim() {
    let upstream = spawn_upstream().await;
    let registry = assigned_registry();
    let store = working_store();
    let server = create_test_server(&upstream, registry.clone(), store.clone());

    let response = server
        .get("/latest/dynamic/instance-identity/document")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-upstream"), "imds");
    assert_eq!(response.header("content-type"), "application/json");
    assert_eq!(
        response.text(),
        r#"{"region":"us-east-1","instanceId":"i-0123456789abcdef0"}"#
    );

    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

/// Upstream error statuses pass through as-is.
#[tokio::test]
async fn test_upstream_status_is_relayed() {
    let upstream = spawn_upstream().await;
    let server = create_test_server(&upstream, assigned_registry(), working_store());

    let response = server.get("/latest/meta-data/nothing-here").await;
    response.assert_status_not_found();
}

/// Only GET is answered locally; other methods on the credentials path go upstream.
#[tokio::test]
async fn test_non_get_credentials_request_is_proxied() {
    let upstream = spawn_upstream().await;
    let registry = assigned_registry();
    let store = working_store();
    let server = create_test_server(&upstream, registry.clone(), store.clone());

    let response = server.post(CREDENTIALS_PATH).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.text(), "upstream");

    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

/// A request body, query string and session token header reach the upstream untouched.
#[tokio::test]
async fn test_request_body_query_and_token_are_relayed() {
    let upstream = spawn_upstream().await;
    let registry = assigned_registry();
    let store = working_store();
    let server = create_test_server(&upstream, registry.clone(), store.clone());

    let payload: &'static [u8] = b"\x00\x01 raw body\r\n\xff";
    let response = server
        .post("/latest/api/echo?a=1&b=2")
        .add_header(
            HeaderName::from_static(TOKEN_HEADER),
            HeaderValue::from_static("AQAEAFakeSessionToken=="),
        )
        .bytes(Bytes::from_static(payload))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-echo-method"), "POST");
    assert_eq!(response.header("x-echo-query"), "a=1&b=2");
    assert_eq!(response.header("x-echo-token"), "AQAEAFakeSessionToken==");
    assert_eq!(response.as_bytes().as_ref(), payload);

    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

/// The upstream sees its own authority in `Host`, not the proxy's.
#[tokio::test]
async fn test_upstream_receives_its_own_host() {
    let upstream = spawn_upstream().await;
    let server = create_test_server(&upstream, assigned_registry(), working_store());

    let response = server.get("/latest/meta-data/local-hostname").await;
    response.assert_status_ok();
    assert_eq!(response.text(), upstream.trim_start_matches("http://"));
}

/// A connection failure to the upstream becomes an empty 502.
#[tokio::test]
async fn test_unreachable_upstream_returns_502() {
    let upstream = unreachable_upstream().await;
    let server = create_test_server(&upstream, assigned_registry(), working_store());

    let response = server.get("/latest/meta-data/instance-id").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(response.as_bytes().is_empty());
}
