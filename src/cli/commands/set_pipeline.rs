//! Set-pipeline command - install the self-update pipeline

use crate::cli::args::SetPipelineArgs;
use crate::cli::commands::build_client;
use crate::client::PipelineClient;
use crate::config::Config;
use crate::error::{CupError, CupResult};
use crate::pipeline::PIPELINE_NAME;
use console::style;

/// Execute the set-pipeline command
pub async fn execute(args: SetPipelineArgs, config: &Config) -> CupResult<()> {
    let mut client = build_client(config).await?;

    let allow = args.allow_fly_version_discrepancy || config.client.allow_fly_version_discrepancy;
    let result = client.set_default_pipeline(&config.deployment, allow).await;
    CupError::with_cleanup(result, client.cleanup())?;

    println!(
        "{} Pipeline {} set on {}",
        style("✓").green(),
        style(PIPELINE_NAME).bold(),
        config.target.url
    );
    Ok(())
}
