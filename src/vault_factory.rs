use reqwest::Client;

use crate::error::SetupError;
use crate::vault::VaultClient;

pub const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Inputs for building a [`VaultFactory`].
#[derive(Debug, Clone)]
pub struct FactoryConfig {
    pub http_client: Option<Client>,
    pub address: String,
    pub admin_token: String,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            http_client: Some(Client::new()),
            address: DEFAULT_VAULT_ADDR.to_string(),
            admin_token: String::new(),
        }
    }
}

/// Builds admin-authenticated Vault clients. Construction does no network I/O.
#[derive(Debug, Clone)]
pub struct VaultFactory {
    http_client: Client,
    address: String,
    admin_token: String,
}

impl VaultFactory {
    /// # Errors
    /// Returns `InvalidConfiguration` for an empty address, a missing HTTP client
    /// or an empty admin token, checked in that order.
    pub fn new(config: FactoryConfig) -> Result<Self, SetupError> {
        if config.address.is_empty() {
            return Err(SetupError::invalid("Vault address must not be empty"));
        }
        let Some(http_client) = config.http_client else {
            return Err(SetupError::invalid("HTTP client must not be empty"));
        };
        if config.admin_token.is_empty() {
            return Err(SetupError::invalid("Vault admin token must not be empty"));
        }
        Ok(Self {
            http_client,
            address: config.address,
            admin_token: config.admin_token,
        })
    }

    /// Creates a client bound to the configured address with the admin token set.
    ///
    /// # Errors
    /// Returns `Connection` if the client cannot be constructed, e.g. for a malformed address.
    pub fn new_client(&self) -> Result<VaultClient, SetupError> {
        let mut client = VaultClient::with_http_client(&self.address, self.http_client.clone())
            .map_err(SetupError::Connection)?;
        client.set_token(self.admin_token.clone());
        Ok(client)
    }
}
