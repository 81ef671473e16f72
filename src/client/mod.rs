//! fly client facade
//!
//! Ties the binary cache, launcher, session manager and pipeline renderer
//! together to install the self-update pipeline on a fresh deployment.

pub mod versions;

use crate::cache::BinaryCache;
use crate::config::{Credentials, DeploymentConfig};
use crate::creds::{AwsCredentialChain, CredentialSource};
use crate::error::{CupError, CupResult};
use crate::pipeline::{PipelineRenderer, PIPELINE_NAME, SELF_UPDATE_JOB};
use crate::process::{CommandFactory, Launcher, OutputSinks};
use crate::session::{RetryPolicy, SessionManager};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[cfg(windows)]
const FLY_BINARY: &str = "fly.exe";
#[cfg(not(windows))]
const FLY_BINARY: &str = "fly";

const PIPELINE_FILE: &str = "default-pipeline.yml";

/// Operations the deploy flow needs from a fly client
#[async_trait]
pub trait PipelineClient: Send {
    /// Single login attempt; `false` when the ATC is not reachable yet
    async fn can_connect(&mut self) -> CupResult<bool>;

    /// Install, pause and unpause the self-update pipeline
    async fn set_default_pipeline(
        &mut self,
        config: &DeploymentConfig,
        allow_fly_version_discrepancy: bool,
    ) -> CupResult<()>;

    /// Remove everything written to the scratch directory
    fn cleanup(&mut self) -> CupResult<()>;
}

/// fly client for one Concourse target
pub struct DeploymentClient {
    creds: Credentials,
    versions: Vec<u8>,
    launcher: Launcher,
    cache: BinaryCache,
    credentials: Arc<dyn CredentialSource>,
    retry: RetryPolicy,
    renderer: PipelineRenderer,
    scratch: Option<TempDir>,
    fly: Option<PathBuf>,
}

impl DeploymentClient {
    /// Client spawning real fly processes from the user cache
    pub fn new(creds: Credentials, versions: Vec<u8>, sinks: OutputSinks) -> CupResult<Self> {
        Ok(Self {
            creds,
            versions,
            launcher: Launcher::native(sinks),
            cache: BinaryCache::new()?,
            credentials: Arc::new(AwsCredentialChain),
            retry: RetryPolicy::default(),
            renderer: PipelineRenderer::default(),
            scratch: None,
            fly: None,
        })
    }

    pub fn with_cache(mut self, cache: BinaryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_command_factory(mut self, factory: Arc<dyn CommandFactory>) -> Self {
        self.launcher = Launcher::new(factory, self.launcher.sinks().clone());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credentials = source;
        self
    }

    pub fn with_renderer(mut self, renderer: PipelineRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Log in, waiting for the ATC to come up
    pub async fn login(&mut self) -> CupResult<u32> {
        let fly = self.ensure_fly().await?;
        self.session(fly).authenticate().await
    }

    /// Scratch directory, if one has been created
    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    fn session(&self, fly: PathBuf) -> SessionManager {
        SessionManager::new(self.launcher.clone(), fly, self.creds.clone(), self.retry)
    }

    fn scratch_dir(&mut self) -> CupResult<PathBuf> {
        if let Some(dir) = &self.scratch {
            return Ok(dir.path().to_path_buf());
        }

        let dir = tempfile::Builder::new()
            .prefix("cup-fly-")
            .tempdir()
            .map_err(|e| CupError::io("creating scratch directory", e))?;
        debug!("Created scratch directory {}", dir.path().display());

        let path = dir.path().to_path_buf();
        self.scratch = Some(dir);
        Ok(path)
    }

    /// Copy the cached fly into the scratch directory, once per client.
    ///
    /// `fly sync` rewrites the binary it runs from, so the cache entry is
    /// never executed directly.
    async fn ensure_fly(&mut self) -> CupResult<PathBuf> {
        if let Some(fly) = &self.fly {
            return Ok(fly.clone());
        }

        let url = versions::download_url(&self.versions, "fly")?;
        let cache = self.cache.clone();
        let cached = tokio::task::spawn_blocking(move || cache.acquire(&url))
            .await
            .map_err(|e| CupError::Internal(format!("fly download task failed: {}", e)))??;

        let fly = self.scratch_dir()?.join(FLY_BINARY);
        tokio::fs::copy(&cached, &fly)
            .await
            .map_err(|e| CupError::io(format!("copying fly to {}", fly.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            tokio::fs::set_permissions(&fly, perms)
                .await
                .map_err(|e| CupError::io("setting fly permissions", e))?;
        }

        self.fly = Some(fly.clone());
        Ok(fly)
    }

    async fn run_fly(&self, fly: &Path, args: &[&str]) -> CupResult<()> {
        let mut argv = vec!["--target".to_string(), self.creds.name.clone()];
        argv.extend(args.iter().map(|a| a.to_string()));
        self.launcher.run(fly, argv).await
    }
}

#[async_trait]
impl PipelineClient for DeploymentClient {
    async fn can_connect(&mut self) -> CupResult<bool> {
        let fly = self.ensure_fly().await?;
        self.session(fly).try_login().await
    }

    async fn set_default_pipeline(
        &mut self,
        config: &DeploymentConfig,
        allow_fly_version_discrepancy: bool,
    ) -> CupResult<()> {
        // Render first so a bad config fails before touching the ATC.
        let document = self
            .renderer
            .render_with(config, self.credentials.as_ref())
            .await?;

        let fly = self.ensure_fly().await?;
        let mut session = self.session(fly.clone());
        session.authenticate().await?;
        if allow_fly_version_discrepancy {
            session.sync_and_reauthenticate().await?;
        }

        let pipeline_path = self.scratch_dir()?.join(PIPELINE_FILE);
        write_private(&pipeline_path, &document).await?;

        let config_arg = pipeline_path.to_string_lossy().into_owned();
        self.run_fly(
            &fly,
            &[
                "set-pipeline",
                "--pipeline",
                PIPELINE_NAME,
                "--config",
                &config_arg,
                "--non-interactive",
            ],
        )
        .await?;

        tokio::fs::remove_file(&pipeline_path)
            .await
            .map_err(|e| CupError::Cleanup {
                path: pipeline_path.clone(),
                source: e,
            })?;

        let job = format!("{}/{}", PIPELINE_NAME, SELF_UPDATE_JOB);
        self.run_fly(&fly, &["pause-job", "--job", &job]).await?;
        self.run_fly(&fly, &["unpause-pipeline", "--pipeline", PIPELINE_NAME])
            .await?;

        info!("Pipeline {} set on {}", PIPELINE_NAME, self.creds.url);
        Ok(())
    }

    fn cleanup(&mut self) -> CupResult<()> {
        self.fly = None;
        match self.scratch.take() {
            None => Ok(()),
            Some(dir) => {
                let path = dir.path().to_path_buf();
                debug!("Removing scratch directory {}", path.display());
                dir.close().map_err(|e| CupError::Cleanup { path, source: e })
            }
        }
    }
}

/// Write a secrets-bearing file readable by the owner only
async fn write_private(path: &Path, contents: &[u8]) -> CupResult<()> {
    let context = || format!("writing {}", path.display());

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| CupError::io(context(), e))?;
    file.write_all(contents)
        .await
        .map_err(|e| CupError::io(context(), e))?;
    file.sync_all()
        .await
        .map_err(|e| CupError::io(context(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{HttpResponse, Transport};
    use crate::creds::{AwsCredentials, StaticCredentials};
    use crate::process::testing::{FakeResult, ScriptedFactory};
    use std::io::Cursor;
    use std::time::Duration;

    const VERSIONS: &[u8] = br#"{"fly": {
        "mac": "https://example.com/fly-darwin",
        "linux": "https://example.com/fly-linux",
        "windows": "https://example.com/fly-windows.exe"
    }}"#;

    struct FlyServer;

    impl Transport for FlyServer {
        fn get(&self, _url: &str) -> CupResult<HttpResponse> {
            Ok(HttpResponse {
                content_type: None,
                body: Box::new(Cursor::new(b"#!/bin/sh\n".to_vec())),
            })
        }
    }

    fn creds() -> Credentials {
        Credentials {
            name: "concourse-up-myteam".to_string(),
            url: "https://ci.myteam.io".to_string(),
            username: "admin".to_string(),
            password: "s3cret".to_string(),
            ca_cert: None,
        }
    }

    fn deployment() -> DeploymentConfig {
        DeploymentConfig {
            deployment: "concourse-up-myteam".to_string(),
            domain: "ci.myteam.io".to_string(),
            concourse_worker_count: 3,
            ..DeploymentConfig::default()
        }
    }

    fn client(results: Vec<FakeResult>) -> (DeploymentClient, ScriptedFactory, TempDir) {
        let cache_root = TempDir::new().unwrap();
        let factory = ScriptedFactory::new(results);
        let client = DeploymentClient::new(creds(), VERSIONS.to_vec(), OutputSinks::discard())
            .unwrap()
            .with_cache(BinaryCache::with_root(cache_root.path()).with_transport(Arc::new(FlyServer)))
            .with_command_factory(Arc::new(factory.clone()))
            .with_retry_policy(RetryPolicy {
                attempts: 3,
                interval: Duration::ZERO,
            })
            .with_credential_source(Arc::new(StaticCredentials(AwsCredentials {
                access_key_id: "AKIAEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            })))
            .with_renderer(PipelineRenderer::new("0.9.1"));
        (client, factory, cache_root)
    }

    fn subcommands(factory: &ScriptedFactory) -> Vec<String> {
        factory.calls().iter().map(|args| args[2].clone()).collect()
    }

    #[tokio::test]
    async fn sets_pauses_and_unpauses_pipeline() {
        let (mut client, factory, _cache) = client(vec![]);

        client.set_default_pipeline(&deployment(), false).await.unwrap();

        assert_eq!(
            subcommands(&factory),
            vec!["login", "set-pipeline", "pause-job", "unpause-pipeline"]
        );

        let calls = factory.calls();
        assert_eq!(calls[1][..4], ["--target", "concourse-up-myteam", "set-pipeline", "--pipeline"]);
        assert_eq!(calls[1][4], PIPELINE_NAME);
        assert_eq!(calls[1].last().unwrap(), "--non-interactive");
        assert_eq!(
            calls[2],
            vec!["--target", "concourse-up-myteam", "pause-job", "--job", "concourse-up-self-update/self-update"]
        );
        assert_eq!(
            calls[3],
            vec!["--target", "concourse-up-myteam", "unpause-pipeline", "--pipeline", "concourse-up-self-update"]
        );

        let documents = factory.documents();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].contains("DEPLOYMENT: \"myteam\""));

        let scratch = client.scratch_path().unwrap().to_path_buf();
        assert!(!scratch.join(PIPELINE_FILE).exists());
        assert!(scratch.join(FLY_BINARY).exists());

        client.cleanup().unwrap();
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn version_discrepancy_syncs_and_logs_in_again() {
        let (mut client, factory, _cache) = client(vec![]);

        client.set_default_pipeline(&deployment(), true).await.unwrap();

        assert_eq!(
            subcommands(&factory),
            vec!["login", "sync", "login", "set-pipeline", "pause-job", "unpause-pipeline"]
        );
    }

    #[tokio::test]
    async fn failed_step_aborts_the_rest() {
        let (mut client, factory, _cache) =
            client(vec![FakeResult::ok(), FakeResult::fail("invalid pipeline")]);

        let err = client
            .set_default_pipeline(&deployment(), false)
            .await
            .unwrap_err();

        assert!(matches!(err, CupError::CommandExit { .. }));
        assert_eq!(subcommands(&factory), vec!["login", "set-pipeline"]);
        client.cleanup().unwrap();
    }

    #[tokio::test]
    async fn login_timeout_propagates() {
        let unreachable = FakeResult::fail("could not reach the Concourse server called x");
        let (mut client, factory, _cache) = client(vec![unreachable; 3]);

        let err = client
            .set_default_pipeline(&deployment(), false)
            .await
            .unwrap_err();

        assert!(matches!(err, CupError::LoginTimeout { attempts: 3, .. }));
        assert_eq!(factory.calls().len(), 3);
    }

    #[tokio::test]
    async fn can_connect_is_a_single_attempt() {
        let (mut client, factory, _cache) = client(vec![FakeResult::fail(
            "could not reach the Concourse server called x",
        )]);

        assert!(!client.can_connect().await.unwrap());
        assert!(client.can_connect().await.unwrap());
        assert_eq!(factory.calls().len(), 2);
    }

    #[tokio::test]
    async fn fly_is_installed_once_per_client() {
        let (mut client, _factory, cache) = client(vec![]);

        client.login().await.unwrap();
        let first = client.fly.clone().unwrap();
        client.login().await.unwrap();

        assert_eq!(client.fly.clone().unwrap(), first);
        let cached = std::fs::read_dir(cache.path().join("concourse-up").join("bin"))
            .unwrap()
            .count();
        assert_eq!(cached, 1);
    }

    #[test]
    fn cleanup_without_resources_is_ok() {
        let (mut client, _factory, _cache) = client(vec![]);
        client.cleanup().unwrap();
        client.cleanup().unwrap();
    }
}
