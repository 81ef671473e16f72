//! Error types for cup-fly
//!
//! All modules use `CupResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cup-fly operations
pub type CupResult<T> = Result<T, CupError>;

/// All errors that can occur in cup-fly
#[derive(Error, Debug)]
pub enum CupError {
    // Platform errors
    #[error("unknown os: `{0}`")]
    UnsupportedPlatform(String),

    #[error("Versions document has no {tool} download for {os}")]
    ToolNotListed { tool: String, os: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    // Credential errors
    #[error("AWS credentials not configured. Run: aws configure")]
    AwsNotConfigured,

    #[error("AWS credential error: {0}")]
    AwsCredential(String),

    // Binary cache errors
    #[error("No user cache directory available on this system")]
    CacheDirUnavailable,

    #[error("Download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Archive from {url} contains no entries")]
    EmptyArchive { url: String },

    #[error("Invalid archive from {url}: {reason}")]
    Archive { url: String, reason: String },

    #[error(
        "Failed to cache {url} at {}: {source}{}",
        .path.display(),
        cleanup_note(.cleanup)
    )]
    CacheFetch {
        url: String,
        path: PathBuf,
        #[source]
        source: Box<CupError>,
        cleanup: Option<std::io::Error>,
    },

    // Session errors
    #[error("Login to {url} failed: {stderr}")]
    LoginFailed { url: String, stderr: String },

    #[error("failed to log in to {url} after {elapsed_secs} seconds ({attempts} attempts)")]
    LoginTimeout {
        url: String,
        attempts: u32,
        elapsed_secs: u64,
    },

    // Pipeline errors
    #[error("Template error: {0}")]
    Template(String),

    #[error("Rendered pipeline is not valid YAML: {0}")]
    PipelineDocument(#[from] serde_yaml::Error),

    #[error("Failed to remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source} (cleanup also failed: {cleanup})")]
    CleanupAfterFailure {
        #[source]
        source: Box<CupError>,
        cleanup: Box<CupError>,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited unsuccessfully: {command}, exit code: {}", exit_code(.code))]
    CommandExit { command: String, code: Option<i32> },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn cleanup_note(cleanup: &Option<std::io::Error>) -> String {
    match cleanup {
        Some(e) => format!(" (partial file could not be removed: {})", e),
        None => String::new(),
    }
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl CupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Fold a cleanup result into the result of the operation it followed.
    ///
    /// The operation's error always wins; a cleanup failure rides along with it.
    pub fn with_cleanup<T>(result: CupResult<T>, cleanup: CupResult<()>) -> CupResult<T> {
        match (result, cleanup) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup)) => Err(cleanup),
            (Err(primary), Ok(())) => Err(primary),
            (Err(primary), Err(cleanup)) => Err(Self::CleanupAfterFailure {
                source: Box::new(primary),
                cleanup: Box::new(cleanup),
            }),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LoginTimeout { .. } | Self::Download { .. } => true,
            Self::CacheFetch { source, .. } | Self::CleanupAfterFailure { source, .. } => {
                source.is_retryable()
            }
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CleanupAfterFailure { source, .. } => source.hint(),
            Self::AwsNotConfigured => Some("Run: aws configure"),
            Self::ConfigNotFound(_) => Some("Pass --config or set CUP_FLY_CONFIG"),
            Self::MissingSetting("client.versions") => {
                Some("Point client.versions at the versions JSON shipped with the release")
            }
            Self::LoginTimeout { .. } => {
                Some("The ATC may still be starting; check the deployment and retry")
            }
            Self::CacheFetch { .. } => Some("The partial download was discarded; retry"),
            e if e.is_retryable() => Some("This failure may be transient; run the command again"),
            _ => None,
        }
    }
}
