//! Log in to a freshly deployed ATC, retrying until it is reachable

use crate::config::Credentials;
use crate::error::{CupError, CupResult};
use crate::process::Launcher;
use crate::session::state::{RetryPolicy, SessionState};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// fly's stderr text when the ATC is not accepting connections yet
pub const UNREACHABLE_MARKER: &str = "could not reach the Concourse server";

/// Drives `fly login` against one target
pub struct SessionManager {
    launcher: Launcher,
    fly: PathBuf,
    creds: Credentials,
    policy: RetryPolicy,
    state: SessionState,
}

impl SessionManager {
    pub fn new(launcher: Launcher, fly: PathBuf, creds: Credentials, policy: RetryPolicy) -> Self {
        Self {
            launcher,
            fly,
            creds,
            policy,
            state: SessionState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// One login attempt: `Ok(true)` logged in, `Ok(false)` ATC unreachable
    pub async fn try_login(&mut self) -> CupResult<bool> {
        let attempt = match self.state {
            SessionState::Attempting(n) => n,
            _ => 1,
        };
        self.state = SessionState::Attempting(attempt);

        let outcome = match self
            .launcher
            .run_captured(&self.fly, self.login_args())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = SessionState::Fatal;
                return Err(e);
            }
        };

        if outcome.success {
            self.state = SessionState::Authenticated;
            return Ok(true);
        }

        for line in outcome.stderr.lines() {
            self.launcher.sinks().err(line);
        }

        if outcome.stderr.contains(UNREACHABLE_MARKER) {
            debug!("{} not reachable yet (attempt {})", self.creds.url, attempt);
            self.state = SessionState::Unreachable;
            return Ok(false);
        }

        self.state = SessionState::Fatal;
        Err(CupError::LoginFailed {
            url: self.creds.url.clone(),
            stderr: outcome.stderr,
        })
    }

    /// Log in, retrying while the ATC is unreachable.
    ///
    /// Returns the number of attempts it took.
    pub async fn authenticate(&mut self) -> CupResult<u32> {
        self.launcher
            .sinks()
            .out("Waiting for Concourse ATC to start... ");

        for attempt in 1..=self.policy.attempts {
            self.state = SessionState::Attempting(attempt);
            if self.try_login().await? {
                info!("Logged in to {} after {} attempt(s)", self.creds.url, attempt);
                return Ok(attempt);
            }
            tokio::time::sleep(self.policy.interval).await;
        }

        warn!(
            "Gave up logging in to {} after {} attempts",
            self.creds.url, self.policy.attempts
        );
        self.state = SessionState::Fatal;
        Err(CupError::LoginTimeout {
            url: self.creds.url.clone(),
            attempts: self.policy.attempts,
            elapsed_secs: self.policy.ceiling().as_secs(),
        })
    }

    /// Replace the local fly with the ATC's version, then log in again
    pub async fn sync_and_reauthenticate(&mut self) -> CupResult<u32> {
        info!("Syncing fly with {}", self.creds.url);

        let args = vec![
            "--target".to_string(),
            self.creds.name.clone(),
            "sync".to_string(),
        ];
        if let Err(e) = self.launcher.run(&self.fly, args).await {
            self.state = SessionState::Fatal;
            return Err(e);
        }

        self.authenticate().await
    }

    fn login_args(&self) -> Vec<String> {
        vec![
            "--target".to_string(),
            self.creds.name.clone(),
            "login".to_string(),
            "--insecure".to_string(),
            "--concourse-url".to_string(),
            self.creds.url.clone(),
            "--username".to_string(),
            self.creds.username.clone(),
            "--password".to_string(),
            self.creds.password.clone(),
        ]
    }
}
