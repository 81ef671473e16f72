//! Download URL lookup from the release's versions document
//!
//! The document maps tool name to OS to URL:
//! `{"fly": {"linux": "...", "mac": "...", "windows": "..."}}`

use crate::error::{CupError, CupResult};
use std::collections::HashMap;

type VersionsDocument = HashMap<String, HashMap<String, String>>;

/// Download URL of `tool` for the host OS
pub fn download_url(versions: &[u8], tool: &str) -> CupResult<String> {
    download_url_for(versions, tool, std::env::consts::OS)
}

/// Download URL of `tool` for `os` (a `std::env::consts::OS` value)
pub fn download_url_for(versions: &[u8], tool: &str, os: &str) -> CupResult<String> {
    let key = match os {
        "macos" => "mac",
        "linux" => "linux",
        "windows" => "windows",
        other => return Err(CupError::UnsupportedPlatform(other.to_string())),
    };

    let document: VersionsDocument = serde_json::from_slice(versions)?;

    document
        .get(tool)
        .and_then(|urls| urls.get(key))
        .filter(|url| !url.is_empty())
        .cloned()
        .ok_or_else(|| CupError::ToolNotListed {
            tool: tool.to_string(),
            os: key.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSIONS: &[u8] = br#"{
        "fly": {
            "mac": "https://example.com/fly-darwin-amd64",
            "linux": "https://example.com/fly-linux-amd64",
            "windows": "https://example.com/fly-windows-amd64.exe"
        }
    }"#;

    #[test]
    fn maps_host_os_names() {
        assert_eq!(
            download_url_for(VERSIONS, "fly", "macos").unwrap(),
            "https://example.com/fly-darwin-amd64"
        );
        assert_eq!(
            download_url_for(VERSIONS, "fly", "linux").unwrap(),
            "https://example.com/fly-linux-amd64"
        );
        assert_eq!(
            download_url_for(VERSIONS, "fly", "windows").unwrap(),
            "https://example.com/fly-windows-amd64.exe"
        );
    }

    #[test]
    fn other_os_is_unsupported() {
        let err = download_url_for(VERSIONS, "fly", "freebsd").unwrap_err();
        assert!(matches!(err, CupError::UnsupportedPlatform(ref os) if os == "freebsd"));
    }

    #[test]
    fn missing_tool_is_reported() {
        let err = download_url_for(VERSIONS, "bosh-cli", "linux").unwrap_err();
        assert!(matches!(err, CupError::ToolNotListed { .. }));
    }

    #[test]
    fn malformed_document_is_json_error() {
        let err = download_url_for(b"[1, 2]", "fly", "linux").unwrap_err();
        assert!(matches!(err, CupError::Json(_)));
    }
}
