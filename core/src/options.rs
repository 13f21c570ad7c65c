//! Client-wide request options.
//!
//! # Design
//! Options are fixed at client construction and applied uniformly to every
//! generated operation. They deserialize from a JSON or YAML mapping with
//! every field optional, so a configuration file can carry them alongside
//! other settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transport settings passed through to every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Extra headers, sent in order after the content type.
    pub headers: Vec<(String, String)>,
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,
    /// Whole-request timeout in milliseconds. `None` leaves the transport
    /// default.
    pub timeout_ms: Option<u64>,
    /// What to do with a payload sent to a read-only call.
    pub read_only: ReadOnlyPolicy,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            verify_tls: true,
            timeout_ms: None,
            read_only: ReadOnlyPolicy::Drop,
        }
    }
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn read_only(mut self, policy: ReadOnlyPolicy) -> Self {
        self.read_only = policy;
        self
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Handling of a `data` payload supplied to a call whose template marks it
/// read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOnlyPolicy {
    /// Send the request without the payload.
    #[default]
    Drop,
    /// Fail the invocation with `ApiError::ReadOnlyViolation`.
    Reject,
}
