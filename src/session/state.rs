//! Login state machine and retry policy

use std::time::Duration;

/// How long to keep trying to log in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of login attempts
    pub attempts: u32,
    /// Pause after each unreachable attempt
    pub interval: Duration,
}

impl RetryPolicy {
    /// Total time spent sleeping when every attempt is unreachable
    pub fn ceiling(&self) -> Duration {
        self.interval * self.attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 50,
            interval: Duration::from_secs(4),
        }
    }
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No login attempted yet
    Idle,
    /// Login attempt `n` (1-based) in progress
    Attempting(u32),
    /// Logged in
    Authenticated,
    /// Last attempt could not reach the ATC; another may follow
    Unreachable,
    /// Gave up
    Fatal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ceiling_is_200_seconds() {
        assert_eq!(RetryPolicy::default().ceiling(), Duration::from_secs(200));
    }
}
