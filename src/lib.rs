//! cup-fly - fly client automation for concourse-up
//!
//! Downloads and caches the fly CLI, waits for a freshly deployed ATC to
//! accept logins, and installs the self-update pipeline.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod creds;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod session;

pub use client::{DeploymentClient, PipelineClient};
pub use error::{CupError, CupResult};
