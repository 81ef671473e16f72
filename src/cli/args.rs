//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// cup-fly - keep a concourse-up deployment updating itself
///
/// Downloads fly, logs in to the deployed ATC and installs the
/// self-update pipeline.
#[derive(Parser, Debug)]
#[command(name = "cup-fly")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CUP_FLY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the self-update pipeline on the target
    SetPipeline(SetPipelineArgs),

    /// Log in to the target, waiting for the ATC to start
    Login,

    /// Print the self-update pipeline without applying it
    Render(RenderArgs),

    /// Inspect or populate the fly binary cache
    Cache(CacheArgs),
}

/// Arguments for the set-pipeline command
#[derive(Parser, Debug)]
pub struct SetPipelineArgs {
    /// Run `fly sync` when fly and the ATC disagree on version
    #[arg(long)]
    pub allow_fly_version_discrepancy: bool,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Write the pipeline here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print where the binary for a URL is (or would be) cached
    Path {
        /// Download URL
        url: String,
    },

    /// Download a URL into the cache unless already present
    Fetch {
        /// Download URL
        url: String,
    },
}
