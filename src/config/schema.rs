//! Configuration schema for cup-fly
//!
//! Configuration is stored at `~/.config/concourse-up/fly.toml`

use crate::session::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concourse target to log in to
    pub target: Credentials,

    /// Deployment the self-update pipeline maintains
    pub deployment: DeploymentConfig,

    /// fly client behaviour
    pub client: ClientConfig,
}

/// Login details for a Concourse target
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// fly target name
    pub name: String,

    /// ATC URL
    pub url: String,

    pub username: String,

    pub password: String,

    /// PEM CA certificate for the ATC, if any
    pub ca_cert: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ca_cert", &self.ca_cert.is_some())
            .finish()
    }
}

/// Settings of the deployed Concourse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Deployment name, e.g. `concourse-up-myteam`
    pub deployment: String,

    /// Public domain, or the ATC's IP address
    pub domain: String,

    pub concourse_cert: String,

    pub concourse_key: String,

    /// AWS region
    pub region: String,

    pub github_client_id: String,

    pub github_client_secret: String,

    pub concourse_web_size: String,

    pub concourse_worker_size: String,

    pub concourse_worker_count: u32,

    pub namespace: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            deployment: String::new(),
            domain: String::new(),
            concourse_cert: String::new(),
            concourse_key: String::new(),
            region: "eu-west-1".to_string(),
            github_client_id: String::new(),
            github_client_secret: String::new(),
            concourse_web_size: "small".to_string(),
            concourse_worker_size: "xlarge".to_string(),
            concourse_worker_count: 1,
            namespace: String::new(),
        }
    }
}

/// fly client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON document mapping tool -> OS -> download URL
    pub versions: Option<PathBuf>,

    /// Login attempts before giving up
    pub login_attempts: u32,

    /// Seconds between login attempts
    pub login_interval_secs: u64,

    /// Run `fly sync` when the client and ATC versions differ
    pub allow_fly_version_discrepancy: bool,
}

impl ClientConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.login_attempts,
            interval: Duration::from_secs(self.login_interval_secs),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            versions: None,
            login_attempts: policy.attempts,
            login_interval_secs: policy.interval.as_secs(),
            allow_fly_version_discrepancy: false,
        }
    }
}
