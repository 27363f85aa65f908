use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::SetupArgs;
use crate::setup::{DEFAULT_CA_TTL, DEFAULT_NUM_TOKENS, DEFAULT_TOKEN_TTL, SetupRequest};
use crate::vault_factory::DEFAULT_VAULT_ADDR;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub vault: VaultSettings,
    pub setup: SetupDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultSettings {
    pub address: String,
    pub token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SetupDefaults {
    pub ca_ttl: String,
    pub token_ttl: String,
    pub num_tokens: u64,
}

const DEFAULT_CONFIG_FILE: &str = "certctl.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Settings {
    /// Loads settings from defaults, an optional TOML file and `CERTCTL_*` variables.
    ///
    /// # Errors
    /// Returns error if the file or an environment value cannot be parsed.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut s = Config::builder();

        s = s
            .set_default("vault.address", DEFAULT_VAULT_ADDR)?
            .set_default("vault.token", "")?
            .set_default("vault.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("setup.ca_ttl", DEFAULT_CA_TTL)?
            .set_default("setup.token_ttl", DEFAULT_TOKEN_TTL)?
            .set_default("setup.num_tokens", DEFAULT_NUM_TOKENS as u64)?;

        let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        s = s.add_source(File::from(path).required(false));

        // e.g. CERTCTL_VAULT__TIMEOUT_SECS
        s = s.add_source(
            Environment::with_prefix("CERTCTL")
                .prefix_separator("_")
                .separator("__"),
        );

        s.build()?.try_deserialize()
    }

    /// Applies flags (and `VAULT_ADDR` / `VAULT_TOKEN`) on top of file values.
    pub fn merge_with_args(&mut self, args: &SetupArgs) {
        if let Some(address) = &args.vault_addr {
            address.clone_into(&mut self.vault.address);
        }
        if let Some(token) = &args.vault_token {
            token.clone_into(&mut self.vault.token);
        }
        if let Some(ca_ttl) = &args.ca_ttl {
            ca_ttl.clone_into(&mut self.setup.ca_ttl);
        }
        if let Some(token_ttl) = &args.token_ttl {
            token_ttl.clone_into(&mut self.setup.token_ttl);
        }
        if let Some(num_tokens) = args.num_tokens {
            self.setup.num_tokens = num_tokens;
        }
    }

    /// # Errors
    /// Returns error if any setting is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.vault.timeout_secs == 0 {
            anyhow::bail!("vault.timeout_secs must be greater than 0");
        }
        if self.setup.num_tokens == 0 {
            anyhow::bail!("setup.num_tokens must be greater than 0");
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.vault.timeout_secs)
    }

    /// Builds the setup request from merged settings and the per-run flags.
    ///
    /// # Errors
    /// Returns error if the token count does not fit this platform.
    pub fn setup_request(&self, args: &SetupArgs) -> Result<SetupRequest> {
        let num_tokens = usize::try_from(self.setup.num_tokens)
            .map_err(|_| anyhow::anyhow!("setup.num_tokens is too large for this platform"))?;
        Ok(SetupRequest {
            vault_addr: self.vault.address.clone(),
            vault_token: self.vault.token.clone(),
            cluster_id: args.cluster_id.clone(),
            allowed_domains: args.allowed_domains.clone(),
            common_name: args.common_name.clone(),
            ca_ttl: self.setup.ca_ttl.clone(),
            allow_bare_domains: args.allow_bare_domains,
            num_tokens,
            token_ttl: self.setup.token_ttl.clone(),
        })
    }
}
