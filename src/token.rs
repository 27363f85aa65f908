use std::collections::HashSet;
use std::future::Future;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use crate::pki::policy_name;
use crate::vault::{TokenCreateRequest, VaultClient};

/// What the token service needs to mint bootstrap tokens for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreateSpec {
    pub cluster_id: String,
    pub num: usize,
    pub ttl: String,
}

pub trait TokenService {
    /// Mints `spec.num` distinct tokens, returned in creation order.
    fn create(&self, spec: TokenCreateSpec) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// [`TokenService`] backed by Vault's token auth method.
pub struct VaultTokenService<'a> {
    client: &'a VaultClient,
}

impl<'a> VaultTokenService<'a> {
    #[must_use]
    pub fn new(client: &'a VaultClient) -> Self {
        Self { client }
    }
}

impl TokenService for VaultTokenService<'_> {
    async fn create(&self, spec: TokenCreateSpec) -> Result<Vec<String>> {
        if spec.num == 0 {
            anyhow::bail!("token count must be at least 1");
        }
        let policies = vec![policy_name(&spec.cluster_id)];
        let display_name = format!("{}-bootstrap", spec.cluster_id);
        let request = TokenCreateRequest {
            policies: &policies,
            ttl: &spec.ttl,
            no_parent: true,
            display_name: &display_name,
            meta: json!({ "cluster_id": spec.cluster_id }),
        };

        let mut tokens = Vec::with_capacity(spec.num);
        let mut seen = HashSet::with_capacity(spec.num);
        for index in 1..=spec.num {
            let token = self
                .client
                .create_token(&request)
                .await
                .with_context(|| format!("Failed to create token {index} of {}", spec.num))?;
            if !seen.insert(token.clone()) {
                anyhow::bail!("Vault returned a duplicate token at position {index}");
            }
            tokens.push(token);
        }
        info!(
            "Created {} token(s) for cluster {}",
            tokens.len(),
            spec.cluster_id
        );
        Ok(tokens)
    }
}
