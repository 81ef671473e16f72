//! HTTP transport used to populate the binary cache

use crate::error::{CupError, CupResult};
use std::io::Read;
use tracing::debug;

/// A fetched response: declared content type plus a body stream
pub struct HttpResponse {
    pub content_type: Option<String>,
    pub body: Box<dyn Read>,
}

/// Blocking HTTP GET
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> CupResult<HttpResponse>;
}

/// Transport backed by `ureq`
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> CupResult<HttpResponse> {
        debug!("GET {}", url);

        let response = ureq::get(url).call().map_err(|e| CupError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(HttpResponse {
            content_type,
            body: Box::new(response.into_body().into_reader()),
        })
    }
}
