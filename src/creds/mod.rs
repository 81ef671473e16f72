//! Cloud credential resolution
//!
//! Credentials are looked up when they are needed, never persisted, so
//! rotated or session-scoped keys are always current.

pub mod aws;

pub use aws::{AwsCredentialChain, AwsCredentials, CredentialSource, StaticCredentials};
