//! Self-update pipeline rendering
//!
//! The pipeline has two jobs sharing the `cup` serial group:
//! - `self-update`: redeploys whenever a new concourse-up release appears
//! - `renew-cert`: redeploys monthly with the currently installed release
//!
//! Output depends only on its inputs, so re-applying it is idempotent.

pub mod params;
pub mod template;

pub use params::{is_ipv4, PipelineParams, DEPLOYMENT_PREFIX};

use crate::config::DeploymentConfig;
use crate::creds::{AwsCredentials, CredentialSource};
use crate::error::CupResult;
use tracing::debug;

/// Name of the pipeline set on the target
pub const PIPELINE_NAME: &str = "concourse-up-self-update";

/// Job paused right after the pipeline is set
pub const SELF_UPDATE_JOB: &str = "self-update";

/// Monthly certificate renewal job
pub const RENEW_CERT_JOB: &str = "renew-cert";

/// Serial group shared by both jobs
pub const SERIAL_GROUP: &str = "cup";

/// Release tag the renew-cert job is pinned to
pub const VERSION: &str = match option_env!("CONCOURSE_UP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

macro_rules! update_task {
    () => {
        r#"  - task: update
    params:
      AWS_REGION: {{ quote region }}
      DOMAIN: {{ quote domain }}
      TLS_CERT: |-
        {{ indent 8 tls_cert }}
      TLS_KEY: |-
        {{ indent 8 tls_key }}
      WORKERS: {{ quote workers }}
      WORKER_SIZE: {{ quote worker_size }}
      WEB_SIZE: {{ quote web_size }}
      DEPLOYMENT: {{ quote deployment }}
      GITHUB_AUTH_CLIENT_ID: {{ quote github_client_id }}
      GITHUB_AUTH_CLIENT_SECRET: {{ quote github_client_secret }}
      AWS_ACCESS_KEY_ID: {{ quote aws_access_key_id }}
      AWS_SECRET_ACCESS_KEY: {{ quote aws_secret_access_key }}
      SELF_UPDATE: true
      NAMESPACE: {{ quote namespace }}
    config:
      platform: linux
      image_resource:
        type: docker-image
        source:
          repository: engineerbetter/pcf-ops
      inputs:
      - name: concourse-up-release
      run:
        path: bash
        args:
        - -c
        - |
          set -eux

          cd concourse-up-release
          chmod +x concourse-up-linux-amd64
          ./concourse-up-linux-amd64 deploy $DEPLOYMENT
"#
    };
}

const TEMPLATE: &str = concat!(
    r#"---
resources:
- name: concourse-up-release
  type: github-release
  source:
    user: engineerbetter
    repository: concourse-up
    pre_release: true
- name: every-month
  type: time
  source: {interval: 730h}

jobs:
- name: self-update
  serial_groups: [cup]
  serial: true
  plan:
  - get: concourse-up-release
    trigger: true
"#,
    update_task!(),
    r#"- name: renew-cert
  serial_groups: [cup]
  serial: true
  plan:
  - get: concourse-up-release
    version: {tag: {{ quote version }}}
  - get: every-month
    trigger: true
"#,
    update_task!(),
);

/// Renders the self-update pipeline for a deployment
#[derive(Debug, Clone)]
pub struct PipelineRenderer {
    version: String,
}

impl PipelineRenderer {
    /// Renderer pinning renew-cert to `version`
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Render with already-resolved AWS credentials
    pub fn render(&self, config: &DeploymentConfig, aws: &AwsCredentials) -> CupResult<Vec<u8>> {
        self.render_params(&PipelineParams::new(config, aws, &self.version))
    }

    /// Render, resolving AWS credentials from `source` now
    pub async fn render_with(
        &self,
        config: &DeploymentConfig,
        source: &dyn CredentialSource,
    ) -> CupResult<Vec<u8>> {
        let aws = source.resolve().await?;
        self.render(config, &aws)
    }

    /// Render prepared parameters, checking the result parses as YAML
    pub fn render_params(&self, params: &PipelineParams) -> CupResult<Vec<u8>> {
        debug!("Rendering pipeline for {:?}", params);
        let document = template::render(TEMPLATE, &params.values())?;
        serde_yaml::from_str::<serde_yaml::Value>(&document)?;
        Ok(document.into_bytes())
    }
}

impl Default for PipelineRenderer {
    fn default() -> Self {
        Self::new(VERSION)
    }
}
