// Helper functions are shared across multiple test crates; not every helper is
// referenced in each test module.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub(crate) const ROOT_TOKEN: &str = "root";
pub(crate) const CLUSTER_ID: &str = "c1";
pub(crate) const CA_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----";

/// Hands out a fresh token on every call.
pub(crate) struct TokenSequence {
    next: AtomicUsize,
}

impl TokenSequence {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicUsize::new(1),
        }
    }
}

impl Respond for TokenSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(json!({
            "auth": {
                "client_token": format!("hvs.bootstrap-{n}"),
                "policies": ["default", "pki-issue-policy-c1"],
                "lease_duration": 2_592_000,
                "renewable": true
            }
        }))
    }
}

pub(crate) async fn stub_mount_missing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts/pki-c1"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["No secret engine mount at pki-c1/"]
        })))
        .mount(server)
        .await;
}

pub(crate) async fn stub_mount_existing(server: &MockServer, mount_type: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts/pki-c1"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": mount_type,
                "config": { "max_lease_ttl": 311_040_000 }
            }
        })))
        .mount(server)
        .await;
}

pub(crate) async fn stub_mount_create(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/pki-c1"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .and(body_json(json!({
            "type": "pki",
            "config": { "max_lease_ttl": "86400h" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub(crate) async fn stub_ca_missing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/pki-c1/cert/ca"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

pub(crate) async fn stub_ca_missing_issuer(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/pki-c1/cert/ca"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["no default issuer currently configured"]
        })))
        .mount(server)
        .await;
}

pub(crate) async fn stub_ca_existing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/pki-c1/cert/ca"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "certificate": CA_PEM }
        })))
        .mount(server)
        .await;
}

pub(crate) async fn stub_root_generate(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/pki-c1/root/generate/internal"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .and(body_json(json!({
            "common_name": "c1 CA",
            "ttl": "86400h"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "certificate": CA_PEM,
                "issuing_ca": CA_PEM,
                "serial_number": "3a:7f:01"
            }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub(crate) async fn stub_role(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/v1/pki-c1/roles/role-c1"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .and(body_json(json!({
            "allowed_domains": "example.com",
            "allow_subdomains": true,
            "allow_bare_domains": false,
            "ttl": "86400h"
        })))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub(crate) async fn stub_policy(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/sys/policies/acl/pki-issue-policy-c1"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

pub(crate) async fn stub_token_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/create"))
        .and(header("X-Vault-Token", ROOT_TOKEN))
        .and(body_json(json!({
            "policies": ["pki-issue-policy-c1"],
            "ttl": "720h",
            "no_parent": true,
            "display_name": "c1-bootstrap",
            "meta": { "cluster_id": "c1" }
        })))
        .respond_with(TokenSequence::new())
        .mount(server)
        .await;
}

/// A Vault with nothing provisioned yet for `c1`.
pub(crate) async fn stub_fresh_vault(server: &MockServer) {
    stub_mount_missing(server).await;
    stub_mount_create(server, 1).await;
    stub_ca_missing(server).await;
    stub_root_generate(server, 1).await;
    stub_role(server, 204).await;
    stub_policy(server).await;
    stub_token_create(server).await;
}

pub(crate) async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}
