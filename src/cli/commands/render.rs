//! Render command - print the self-update pipeline

use crate::cli::args::RenderArgs;
use crate::config::Config;
use crate::creds::AwsCredentialChain;
use crate::error::{CupError, CupResult};
use crate::pipeline::PipelineRenderer;
use std::io::Write;
use tracing::info;

/// Execute the render command
pub async fn execute(args: RenderArgs, config: &Config) -> CupResult<()> {
    let document = PipelineRenderer::default()
        .render_with(&config.deployment, &AwsCredentialChain)
        .await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &document)
                .await
                .map_err(|e| CupError::io(format!("writing {}", path.display()), e))?;
            info!("Pipeline written to {}", path.display());
        }
        None => std::io::stdout()
            .write_all(&document)
            .map_err(|e| CupError::io("writing pipeline to stdout", e))?,
    }
    Ok(())
}
