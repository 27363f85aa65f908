use std::collections::HashSet;

use reqwest::Client;
use tracing::{info, warn};

use crate::error::SetupError;
use crate::pki::{PkiCreateSpec, PkiService, VaultPkiService};
use crate::token::{TokenCreateSpec, TokenService, VaultTokenService};
use crate::vault_factory::{DEFAULT_VAULT_ADDR, FactoryConfig, VaultFactory};

/// Root CA lifetime, roughly ten years.
pub const DEFAULT_CA_TTL: &str = "86400h";
pub const DEFAULT_TOKEN_TTL: &str = "720h";
pub const DEFAULT_NUM_TOKENS: usize = 1;

/// Operator parameters for one setup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    pub vault_addr: String,
    pub vault_token: String,
    pub cluster_id: String,
    pub allowed_domains: String,
    pub common_name: String,
    pub ca_ttl: String,
    pub allow_bare_domains: bool,
    pub num_tokens: usize,
    pub token_ttl: String,
}

impl Default for SetupRequest {
    fn default() -> Self {
        Self {
            vault_addr: DEFAULT_VAULT_ADDR.to_string(),
            vault_token: String::new(),
            cluster_id: String::new(),
            allowed_domains: String::new(),
            common_name: String::new(),
            ca_ttl: DEFAULT_CA_TTL.to_string(),
            allow_bare_domains: false,
            num_tokens: DEFAULT_NUM_TOKENS,
            token_ttl: DEFAULT_TOKEN_TTL.to_string(),
        }
    }
}

impl SetupRequest {
    /// Checks required fields in a fixed order and reports the first one missing.
    /// TTLs are left for Vault to parse.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` naming the offending field.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.vault_token.is_empty() {
            return Err(SetupError::invalid("Vault token must not be empty"));
        }
        if self.allowed_domains.is_empty() {
            return Err(SetupError::invalid("allowed domains must not be empty"));
        }
        if self.cluster_id.is_empty() {
            return Err(SetupError::invalid("cluster ID must not be empty"));
        }
        if self.common_name.is_empty() {
            return Err(SetupError::invalid("common name must not be empty"));
        }
        if self.num_tokens == 0 {
            return Err(SetupError::invalid("token count must be at least 1"));
        }
        Ok(())
    }

    #[must_use]
    pub fn pki_create_spec(&self) -> PkiCreateSpec {
        PkiCreateSpec {
            cluster_id: self.cluster_id.clone(),
            common_name: self.common_name.clone(),
            allowed_domains: self.allowed_domains.clone(),
            ttl: self.ca_ttl.clone(),
            allow_bare_domains: self.allow_bare_domains,
        }
    }

    #[must_use]
    pub fn token_create_spec(&self) -> TokenCreateSpec {
        TokenCreateSpec {
            cluster_id: self.cluster_id.clone(),
            num: self.num_tokens,
            ttl: self.token_ttl.clone(),
        }
    }
}

/// Outcome of a successful run. The tokens are secrets and are never written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupResult {
    pub cluster_id: String,
    pub tokens: Vec<String>,
}

/// Runs the whole setup: validate, connect, provision the PKI backend, mint tokens.
///
/// Stops at the first failing step. Nothing already provisioned in Vault is
/// undone; running again with the same input is the recovery path.
///
/// # Errors
/// Returns the [`SetupError`] of the step that failed.
pub async fn run_setup(
    request: &SetupRequest,
    http_client: Client,
) -> Result<SetupResult, SetupError> {
    request.validate()?;

    let factory = VaultFactory::new(FactoryConfig {
        http_client: Some(http_client),
        address: request.vault_addr.clone(),
        admin_token: request.vault_token.clone(),
    })?;
    let client = factory.new_client()?;
    info!("Vault client configured for {}", client.address());

    let pki = VaultPkiService::new(&client);
    let tokens = VaultTokenService::new(&client);
    provision(request, &pki, &tokens).await
}

/// Provisions the PKI backend and then mints tokens, in that order.
///
/// # Errors
/// Returns `BackendSetup` or `TokenGeneration` for the step that failed.
pub async fn provision<P, T>(
    request: &SetupRequest,
    pki: &P,
    tokens: &T,
) -> Result<SetupResult, SetupError>
where
    P: PkiService,
    T: TokenService,
{
    let cluster_id = request.cluster_id.clone();

    info!("Setting up PKI backend for cluster {cluster_id}");
    if let Err(source) = pki.create(request.pki_create_spec()).await {
        warn!("PKI backend setup failed for cluster {cluster_id}; re-run to resume");
        return Err(SetupError::BackendSetup { cluster_id, source });
    }

    info!(
        "Generating {} token(s) for cluster {cluster_id}",
        request.num_tokens
    );
    let generated = match tokens.create(request.token_create_spec()).await {
        Ok(generated) => generated,
        Err(source) => {
            warn!("Token generation failed for cluster {cluster_id}; PKI backend stays in place");
            return Err(SetupError::TokenGeneration { cluster_id, source });
        }
    };
    if generated.len() != request.num_tokens {
        return Err(SetupError::TokenGeneration {
            source: anyhow::anyhow!(
                "expected {} tokens, got {}",
                request.num_tokens,
                generated.len()
            ),
            cluster_id,
        });
    }
    let mut seen = HashSet::with_capacity(generated.len());
    if let Some(position) = generated.iter().position(|token| !seen.insert(token)) {
        return Err(SetupError::TokenGeneration {
            source: anyhow::anyhow!("duplicate token at position {}", position + 1),
            cluster_id,
        });
    }

    Ok(SetupResult {
        cluster_id,
        tokens: generated,
    })
}
