//! AWS credential provider using the environment and the AWS CLI

use crate::error::{CupError, CupResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Resolved AWS credentials
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Something that can produce AWS credentials on demand
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn resolve(&self) -> CupResult<AwsCredentials>;
}

/// Fixed credentials, for callers that already hold them
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub AwsCredentials);

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn resolve(&self) -> CupResult<AwsCredentials> {
        Ok(self.0.clone())
    }
}

/// The ambient AWS credential chain.
///
/// Environment variables win; otherwise the AWS CLI exports whatever its
/// own chain (profile, SSO, instance role) resolves to.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsCredentialChain;

impl AwsCredentialChain {
    fn from_env() -> Option<AwsCredentials> {
        let access_key_id = non_empty_env(ACCESS_KEY_ENV)?;
        let secret_access_key = non_empty_env(SECRET_KEY_ENV)?;
        Some(AwsCredentials {
            access_key_id,
            secret_access_key,
            session_token: non_empty_env(SESSION_TOKEN_ENV),
        })
    }

    async fn from_cli() -> CupResult<AwsCredentials> {
        debug!("Exporting AWS credentials via CLI...");

        let output = Command::new("aws")
            .args(["configure", "export-credentials", "--format", "process"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CupError::AwsNotConfigured,
                _ => CupError::command_failed("aws configure export-credentials", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Unable to locate credentials") || stderr.contains("not configured")
            {
                return Err(CupError::AwsNotConfigured);
            }
            return Err(CupError::AwsCredential(stderr.trim().to_string()));
        }

        parse_process_credentials(&output.stdout)
    }
}

#[async_trait]
impl CredentialSource for AwsCredentialChain {
    async fn resolve(&self) -> CupResult<AwsCredentials> {
        if let Some(creds) = Self::from_env() {
            debug!("Using AWS credentials from environment");
            return Ok(creds);
        }
        Self::from_cli().await
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_process_credentials(stdout: &[u8]) -> CupResult<AwsCredentials> {
    let response: ProcessCredentials = serde_json::from_slice(stdout)
        .map_err(|e| CupError::AwsCredential(format!("Failed to parse credentials: {}", e)))?;

    Ok(AwsCredentials {
        access_key_id: response.access_key_id,
        secret_access_key: response.secret_access_key,
        session_token: response.session_token,
    })
}

/// `credential_process` output format
#[derive(Deserialize)]
struct ProcessCredentials {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "SessionToken", default)]
    session_token: Option<String>,
}
