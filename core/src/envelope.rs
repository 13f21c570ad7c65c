//! Responses decorated with how the call was made.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::body::PostBody;
use crate::definition::CallTemplate;
use crate::http::HttpResponse;

/// Informational record attached to every response. Never contains the
/// `data` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallMetadata {
    pub call_name: String,
    /// Template default for `format`.
    pub file_format: Option<Value>,
    /// Template default for `returnFormat`.
    pub error_format: Option<Value>,
    pub kwargs_passed: Map<String, Value>,
    pub post_body_minus_data: PostBody,
}

/// The raw response plus its `CallMetadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub response: HttpResponse,
    pub metadata: CallMetadata,
}

impl ResponseEnvelope {
    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn body(&self) -> &str {
        &self.response.body
    }
}

/// Attaches call metadata to `response`.
pub fn enhance(
    response: HttpResponse,
    call_name: &str,
    template: &CallTemplate,
    kwargs: &Map<String, Value>,
    body: &PostBody,
) -> ResponseEnvelope {
    ResponseEnvelope {
        response,
        metadata: CallMetadata {
            call_name: call_name.to_string(),
            file_format: template.file_format().cloned(),
            error_format: template.error_format().cloned(),
            kwargs_passed: kwargs.clone(),
            post_body_minus_data: body.without_data(),
        },
    }
}
