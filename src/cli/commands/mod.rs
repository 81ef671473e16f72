//! CLI command implementations

pub mod cache;
pub mod login;
pub mod render;
pub mod set_pipeline;

pub use cache::execute as cache;
pub use login::execute as login;
pub use render::execute as render;
pub use set_pipeline::execute as set_pipeline;

use crate::client::DeploymentClient;
use crate::config::{Config, ConfigManager};
use crate::error::CupResult;
use crate::process::OutputSinks;

/// Build a client for the configured target
pub(crate) async fn build_client(config: &Config) -> CupResult<DeploymentClient> {
    let versions = ConfigManager::load_versions(config).await?;
    Ok(
        DeploymentClient::new(config.target.clone(), versions, OutputSinks::terminal())?
            .with_retry_policy(config.client.retry_policy()),
    )
}
