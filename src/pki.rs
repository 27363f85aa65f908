use std::future::Future;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::vault::{PkiRoleParams, VaultClient};

const PKI_ENGINE_TYPE: &str = "pki";

/// What the PKI backend service needs to provision one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkiCreateSpec {
    pub cluster_id: String,
    pub common_name: String,
    /// Comma-separated, passed to Vault as given.
    pub allowed_domains: String,
    pub ttl: String,
    pub allow_bare_domains: bool,
}

pub trait PkiService {
    /// Mounts the cluster's PKI backend, generates its root CA and writes the
    /// issuing role and policy.
    fn create(&self, spec: PkiCreateSpec) -> impl Future<Output = Result<()>> + Send;
}

#[must_use]
pub fn mount_path(cluster_id: &str) -> String {
    format!("pki-{cluster_id}")
}

#[must_use]
pub fn role_name(cluster_id: &str) -> String {
    format!("role-{cluster_id}")
}

#[must_use]
pub fn policy_name(cluster_id: &str) -> String {
    format!("pki-issue-policy-{cluster_id}")
}

fn build_issue_policy(cluster_id: &str) -> String {
    let mount = mount_path(cluster_id);
    let role = role_name(cluster_id);
    format!(
        r#"path "{mount}/issue/{role}" {{
  capabilities = ["create", "update"]
}}
"#
    )
}

/// [`PkiService`] backed by the Vault PKI secrets engine.
pub struct VaultPkiService<'a> {
    client: &'a VaultClient,
}

impl<'a> VaultPkiService<'a> {
    #[must_use]
    pub fn new(client: &'a VaultClient) -> Self {
        Self { client }
    }

    async fn ensure_mount(&self, mount: &str, ttl: &str) -> Result<()> {
        match self.client.get_mount(mount).await? {
            Some(existing) if existing.mount_type == PKI_ENGINE_TYPE => {
                info!("PKI backend {mount} already mounted");
            }
            Some(existing) => {
                anyhow::bail!(
                    "Mount {mount} exists but is of type '{}', not {PKI_ENGINE_TYPE}",
                    existing.mount_type
                );
            }
            None => {
                self.client
                    .mount_engine(mount, PKI_ENGINE_TYPE, ttl)
                    .await
                    .with_context(|| format!("Failed to mount PKI backend {mount}"))?;
                info!("PKI backend {mount} mounted");
            }
        }
        Ok(())
    }

    async fn ensure_root_ca(&self, mount: &str, common_name: &str, ttl: &str) -> Result<()> {
        if self.client.read_ca_certificate(mount).await?.is_some() {
            info!("Root CA for {mount} already present, skipping generation");
            return Ok(());
        }
        let root = self
            .client
            .generate_root_internal(mount, common_name, ttl)
            .await
            .with_context(|| format!("Failed to generate root CA in {mount}"))?;
        info!(
            "Root CA generated in {mount} (serial {})",
            root.serial_number.as_deref().unwrap_or("unknown")
        );
        debug!("Root CA certificate is {} bytes", root.certificate.len());
        Ok(())
    }
}

impl PkiService for VaultPkiService<'_> {
    async fn create(&self, spec: PkiCreateSpec) -> Result<()> {
        let mount = mount_path(&spec.cluster_id);
        self.ensure_mount(&mount, &spec.ttl).await?;
        self.ensure_root_ca(&mount, &spec.common_name, &spec.ttl)
            .await?;

        let role = role_name(&spec.cluster_id);
        self.client
            .write_pki_role(
                &mount,
                &role,
                &PkiRoleParams {
                    allowed_domains: &spec.allowed_domains,
                    allow_subdomains: true,
                    allow_bare_domains: spec.allow_bare_domains,
                    ttl: &spec.ttl,
                },
            )
            .await
            .with_context(|| format!("Failed to create PKI role {role}"))?;
        info!("PKI role {role} created");

        let policy = policy_name(&spec.cluster_id);
        self.client
            .write_policy(&policy, &build_issue_policy(&spec.cluster_id))
            .await
            .with_context(|| format!("Failed to create PKI policy {policy}"))?;
        info!("PKI policy {policy} created");
        Ok(())
    }
}
