//! Content-addressed binary cache
//!
//! Downloaded executables are stored under
//! `<user-cache-dir>/concourse-up/bin/<sha256(url)>`.
//!
//! # Cache semantics
//!
//! | State | Action |
//! |-------|--------|
//! | Entry exists (any size) | Returned as-is, no network I/O |
//! | Entry missing | Created exclusively, then downloaded |
//! | Download failed | Partial entry removed, next call retries |
//!
//! URLs are assumed immutable: an entry is never refreshed.

pub mod binary;
pub mod transport;

pub use binary::{entry_key, BinaryCache};
pub use transport::{HttpResponse, Transport, UreqTransport};
