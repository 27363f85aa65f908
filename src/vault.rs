use std::any::TypeId;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Authenticated handle to one Vault server.
#[derive(Debug, Clone)]
pub struct VaultClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub mount_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootCa {
    pub certificate: String,
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// Parameters written to a PKI role.
#[derive(Debug, Clone, Serialize)]
pub struct PkiRoleParams<'a> {
    pub allowed_domains: &'a str,
    pub allow_subdomains: bool,
    pub allow_bare_domains: bool,
    pub ttl: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenCreateRequest<'a> {
    pub policies: &'a [String],
    pub ttl: &'a str,
    pub no_parent: bool,
    pub display_name: &'a str,
    pub meta: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MountResponse {
    data: MountData,
}

#[derive(Debug, Deserialize)]
struct MountData {
    #[serde(rename = "type")]
    mount_type: String,
}

#[derive(Debug, Deserialize)]
struct CaCertResponse {
    data: CaCertData,
}

#[derive(Debug, Deserialize)]
struct CaCertData {
    #[serde(default)]
    certificate: String,
}

#[derive(Debug, Deserialize)]
struct RootGenerateResponse {
    data: RootCa,
}

#[derive(Debug, Deserialize)]
struct TokenCreateResponse {
    auth: TokenAuth,
}

#[derive(Debug, Deserialize)]
struct TokenAuth {
    client_token: String,
}

impl VaultClient {
    /// Creates a client with its own HTTP transport.
    ///
    /// # Errors
    /// Returns error if the address is not an http(s) URL or the transport cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build Vault HTTP client")?;
        Self::with_http_client(base_url, client)
    }

    /// Creates a client that sends requests through `client`.
    ///
    /// # Errors
    /// Returns error if the address is not an http(s) URL.
    pub fn with_http_client(base_url: &str, client: Client) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).with_context(|| format!("Invalid Vault address: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!(
                "Unsupported Vault address scheme '{}': {base_url}",
                parsed.scheme()
            );
        }
        if parsed.host_str().is_none() {
            anyhow::bail!("Vault address has no host: {base_url}");
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            client,
            token: None,
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Looks up a secrets engine mount. Returns `None` when nothing is mounted at `mount`.
    ///
    /// # Errors
    /// Returns error on transport failure or an unexpected Vault response.
    pub async fn get_mount(&self, mount: &str) -> Result<Option<MountInfo>> {
        let path = format!("sys/mounts/{mount}");
        let response = self
            .authed(self.client.get(self.endpoint(&path)))?
            .send()
            .await
            .context("Failed to query Vault mounts")?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Vault mount response")?;
        if status == StatusCode::NOT_FOUND
            || (status == StatusCode::BAD_REQUEST && text.contains("No secret engine mount"))
        {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Vault API error ({status}): {text}");
        }
        let parsed: MountResponse =
            serde_json::from_str(&text).context("Failed to parse mount response")?;
        Ok(Some(MountInfo {
            mount_type: parsed.data.mount_type,
        }))
    }

    /// Mounts a secrets engine of `engine_type` at `mount`.
    ///
    /// # Errors
    /// Returns error if Vault rejects the mount.
    pub async fn mount_engine(
        &self,
        mount: &str,
        engine_type: &str,
        max_lease_ttl: &str,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct MountRequest<'a> {
            #[serde(rename = "type")]
            mount_type: &'a str,
            config: MountConfig<'a>,
        }
        #[derive(Serialize)]
        struct MountConfig<'a> {
            max_lease_ttl: &'a str,
        }
        self.post_json(
            &format!("sys/mounts/{mount}"),
            &MountRequest {
                mount_type: engine_type,
                config: MountConfig { max_lease_ttl },
            },
        )
        .await
    }

    /// Reads the CA certificate of a PKI mount. Returns `None` if no CA was generated yet.
    ///
    /// # Errors
    /// Returns error on transport failure or an unexpected Vault response.
    pub async fn read_ca_certificate(&self, mount: &str) -> Result<Option<String>> {
        let path = format!("{mount}/cert/ca");
        let response = self
            .authed(self.client.get(self.endpoint(&path)))?
            .send()
            .await
            .with_context(|| format!("Vault request failed: {path}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Vault CA response")?;
        if status == StatusCode::NOT_FOUND
            || status == StatusCode::NO_CONTENT
            || (status.is_client_error() && is_missing_issuer(&text))
        {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Vault API error ({status}): {text}");
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        let parsed: CaCertResponse =
            serde_json::from_str(&text).context("Failed to parse CA certificate response")?;
        let certificate = parsed.data.certificate;
        if certificate.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(certificate))
    }

    /// Generates a root CA whose private key never leaves Vault.
    ///
    /// # Errors
    /// Returns error if Vault rejects the request.
    pub async fn generate_root_internal(
        &self,
        mount: &str,
        common_name: &str,
        ttl: &str,
    ) -> Result<RootCa> {
        #[derive(Serialize)]
        struct RootRequest<'a> {
            common_name: &'a str,
            ttl: &'a str,
        }
        let response: RootGenerateResponse = self
            .post_json(
                &format!("{mount}/root/generate/internal"),
                &RootRequest { common_name, ttl },
            )
            .await?;
        Ok(response.data)
    }

    /// # Errors
    /// Returns error if Vault rejects the role.
    pub async fn write_pki_role(
        &self,
        mount: &str,
        role: &str,
        params: &PkiRoleParams<'_>,
    ) -> Result<()> {
        self.post_json(&format!("{mount}/roles/{role}"), params)
            .await
    }

    /// # Errors
    /// Returns error if Vault rejects the policy.
    pub async fn write_policy(&self, name: &str, policy: &str) -> Result<()> {
        #[derive(Serialize)]
        struct PolicyRequest<'a> {
            policy: &'a str,
        }
        self.post_json(
            &format!("sys/policies/acl/{name}"),
            &PolicyRequest { policy },
        )
        .await
    }

    /// Creates a token and returns its client token string.
    ///
    /// # Errors
    /// Returns error if Vault rejects the request or returns no token.
    pub async fn create_token(&self, request: &TokenCreateRequest<'_>) -> Result<String> {
        let response: TokenCreateResponse = self.post_json("auth/token/create", request).await?;
        if response.auth.client_token.is_empty() {
            anyhow::bail!("Vault returned an empty client token");
        }
        Ok(response.auth.client_token)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Vault token is not set"))?;
        Ok(request.header(VAULT_TOKEN_HEADER, token))
    }

    async fn post_json<T: Serialize, R: DeserializeOwned + 'static>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R> {
        debug!("POST /v1/{path}");
        let response = self
            .authed(self.client.post(self.endpoint(path)))?
            .json(body)
            .send()
            .await
            .with_context(|| format!("Vault request failed: {path}"))?;
        Self::parse_response(response)
            .await
            .with_context(|| format!("Vault response parse failed: {path}"))
    }

    async fn parse_response<T: DeserializeOwned + 'static>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Vault response body")?;
        if !status.is_success() {
            anyhow::bail!("Vault API error ({status}): {text}");
        }
        if text.trim().is_empty() {
            let parsed =
                serde_json::from_str("null").context("Failed to parse empty Vault response")?;
            return Ok(parsed);
        }
        match serde_json::from_str(&text) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                if TypeId::of::<T>() == TypeId::of::<()>() {
                    let parsed = serde_json::from_str("null")
                        .context("Failed to parse Vault response as unit")?;
                    Ok(parsed)
                } else {
                    Err(err).context("Failed to parse Vault response")
                }
            }
        }
    }
}

/// Newer Vault releases answer a CA read on a mount without issuers with a 4xx
/// error such as "no default issuer currently configured".
fn is_missing_issuer(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("no default issuer") || lowered.contains("unable to find pki issuer")
}
