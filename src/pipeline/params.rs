//! Template parameters derived from the deployment config

use crate::config::DeploymentConfig;
use crate::creds::AwsCredentials;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Prefix every deployment name carries
pub const DEPLOYMENT_PREFIX: &str = "concourse-up-";

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$",
    )
    .expect("IPv4 pattern is valid")
});

/// Whether `address` is a dotted-quad IPv4 address (surrounding spaces ignored)
pub fn is_ipv4(address: &str) -> bool {
    IPV4.is_match(address.trim_matches(' '))
}

/// Values substituted into the pipeline template
#[derive(Clone, PartialEq, Eq)]
pub struct PipelineParams {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub deployment: String,
    pub region: String,
    /// Empty when the configured domain is an IP address
    pub domain: String,
    pub github_client_id: String,
    pub github_client_secret: String,
    /// Empty unless `domain` is
    pub tls_cert: String,
    pub tls_key: String,
    pub web_size: String,
    pub worker_size: String,
    pub workers: u32,
    pub version: String,
    pub namespace: String,
}

impl PipelineParams {
    pub fn new(config: &DeploymentConfig, aws: &AwsCredentials, version: &str) -> Self {
        let domain = if is_ipv4(&config.domain) {
            String::new()
        } else {
            config.domain.clone()
        };

        // Certificates for an IP-only ATC are never usable.
        let (tls_cert, tls_key) = if domain.is_empty() {
            (String::new(), String::new())
        } else {
            (config.concourse_cert.clone(), config.concourse_key.clone())
        };

        Self {
            aws_access_key_id: aws.access_key_id.clone(),
            aws_secret_access_key: aws.secret_access_key.clone(),
            deployment: config
                .deployment
                .strip_prefix(DEPLOYMENT_PREFIX)
                .unwrap_or(&config.deployment)
                .to_string(),
            region: config.region.clone(),
            domain,
            github_client_id: config.github_client_id.clone(),
            github_client_secret: config.github_client_secret.clone(),
            tls_cert,
            tls_key,
            web_size: config.concourse_web_size.clone(),
            worker_size: config.concourse_worker_size.clone(),
            workers: config.concourse_worker_count,
            version: version.to_string(),
            namespace: config.namespace.clone(),
        }
    }

    /// Template name -> value
    pub fn values(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("aws_access_key_id", self.aws_access_key_id.clone()),
            ("aws_secret_access_key", self.aws_secret_access_key.clone()),
            ("deployment", self.deployment.clone()),
            ("region", self.region.clone()),
            ("domain", self.domain.clone()),
            ("github_client_id", self.github_client_id.clone()),
            ("github_client_secret", self.github_client_secret.clone()),
            ("tls_cert", self.tls_cert.clone()),
            ("tls_key", self.tls_key.clone()),
            ("web_size", self.web_size.clone()),
            ("worker_size", self.worker_size.clone()),
            ("workers", self.workers.to_string()),
            ("version", self.version.clone()),
            ("namespace", self.namespace.clone()),
        ])
    }
}

impl std::fmt::Debug for PipelineParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineParams")
            .field("deployment", &self.deployment)
            .field("region", &self.region)
            .field("domain", &self.domain)
            .field("workers", &self.workers)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
