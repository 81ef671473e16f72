//! Login command - wait for the ATC and log in

use crate::cli::commands::build_client;
use crate::client::PipelineClient;
use crate::config::Config;
use crate::error::{CupError, CupResult};
use console::style;

/// Execute the login command
pub async fn execute(config: &Config) -> CupResult<()> {
    let mut client = build_client(config).await?;

    let result = client.login().await;
    let attempts = CupError::with_cleanup(result, client.cleanup())?;

    println!(
        "{} Logged in to {} as {} ({} attempt{})",
        style("✓").green(),
        config.target.url,
        config.target.username,
        attempts,
        if attempts == 1 { "" } else { "s" }
    );
    Ok(())
}
