//! Session management module

pub mod manager;
pub mod state;

pub use manager::{SessionManager, UNREACHABLE_MARKER};
pub use state::{RetryPolicy, SessionState};
