//! Executing requests.
//!
//! # Design
//! `Transport` is the single seam between request synthesis and the
//! network. The default `UreqTransport` performs one blocking POST per
//! call with no retries; status codes are returned as data and only
//! network-layer failures become `ApiError::Transport`, with the ureq error
//! preserved as the source.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::options::RequestOptions;

/// Executes one `HttpRequest`. Implementations must be safe to share
/// between threads; operations on many threads use the same transport.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Builds an agent honoring the TLS and timeout settings of `options`.
    /// Headers are applied per request, not here.
    pub fn new(options: &RequestOptions) -> Self {
        let mut config = ureq::Agent::config_builder().http_status_as_error(false);
        if let Some(timeout) = options.timeout_duration() {
            config = config.timeout_global(Some(timeout));
        }
        if !options.verify_tls {
            config = config.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        Self {
            agent: config.build().new_agent(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&RequestOptions::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| ApiError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(|e| ApiError::Transport(Box::new(e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
