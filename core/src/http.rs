//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. An operation can produce the
//! `HttpRequest` it would send without touching the network, and any
//! `Transport` (the bundled ureq one, or the caller's own) executes it.
//! Every call to the survey API is a form-encoded POST to one endpoint, so
//! the request carries no method.

use crate::body::PostBody;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A form POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` body.
    pub body: String,
}

impl HttpRequest {
    /// Form-encodes `body` for a POST to `url`. `headers` are sent after
    /// the content type; a caller `Content-Type` replaces the form default.
    pub fn form(url: &str, body: &PostBody, headers: &[(String, String)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(body.form_pairs())
            .finish();
        let mut all_headers = Vec::with_capacity(headers.len() + 1);
        if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
            all_headers.push(("content-type".to_string(), FORM_CONTENT_TYPE.to_string()));
        }
        all_headers.extend(headers.iter().cloned());
        Self {
            url: url.to_string(),
            headers: all_headers,
            body: encoded,
        }
    }
}

/// A response described as plain data. Non-2xx statuses are not errors at
/// this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
