use std::path::PathBuf;

use anyhow::{Context, Result};
use certctl::{SetupArgs, SetupError};
use certctl::config::Settings;
use reqwest::Client;
use tracing::info;

use crate::cli::output::print_setup_summary;

pub(crate) async fn run_setup_command(
    config_path: Option<PathBuf>,
    args: &SetupArgs,
) -> Result<()> {
    let mut settings = Settings::new(config_path).context("Failed to load configuration")?;
    settings.merge_with_args(args);

    let request = settings
        .setup_request(args)
        .map_err(|err| SetupError::InvalidConfiguration(format!("{err:#}")))?;
    request.validate()?;
    settings
        .validate()
        .map_err(|err| SetupError::InvalidConfiguration(format!("{err:#}")))?;

    let http_client = Client::builder()
        .timeout(settings.timeout())
        .build()
        .context("Failed to build Vault HTTP client")?;

    info!("Starting setup for cluster {}", request.cluster_id);
    let result = certctl::run_setup(&request, http_client).await?;
    print_setup_summary(&result, &request.token_ttl);
    Ok(())
}
