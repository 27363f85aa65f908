use clap::Args;

/// Flags for `certctl setup`. Unset optional values fall back to the config file and defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SetupArgs {
    /// Address used to connect to Vault
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_addr: Option<String>,

    /// Token used to authenticate against Vault
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Cluster ID used to generate a new root CA for
    #[arg(long, default_value = "")]
    pub cluster_id: String,

    /// Comma separated domains allowed to authenticate against the cluster's root CA
    #[arg(long, default_value = "")]
    pub allowed_domains: String,

    /// Common name used to generate a new root CA for
    #[arg(long, default_value = "")]
    pub common_name: String,

    /// TTL used to generate a new root CA (default: 86400h)
    #[arg(long)]
    pub ca_ttl: Option<String>,

    /// Allow issuing certs for bare domains
    #[arg(long)]
    pub allow_bare_domains: bool,

    /// Number of tokens to generate (default: 1)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub num_tokens: Option<u64>,

    /// TTL used to generate new tokens (default: 720h)
    #[arg(long)]
    pub token_ttl: Option<String>,
}
