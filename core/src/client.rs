//! Call factory and generated operations.
//!
//! # Design
//! `ApiClient` turns every entry of a `Definition` into an `Operation` at
//! construction time. No I/O happens there. Each operation owns its own
//! copy of its template and clones it again per invocation, so no call can
//! observe another call's ad-hoc changes. Token and endpoint are fixed for
//! the life of the client; build a new one to change them.
//!
//! Operations are looked up by name. An unknown name fails at lookup with
//! `ApiError::UnknownCall`; `call_names` lists the valid names up front.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::body::{build_body, CallArgs, PostBody};
use crate::definition::{CallTemplate, Definition};
use crate::envelope::{enhance, ResponseEnvelope};
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::options::{ReadOnlyPolicy, RequestOptions};
use crate::transport::{Transport, UreqTransport};
use crate::versions::VersionStore;

/// Client for one survey API endpoint and one definition.
pub struct ApiClient {
    endpoint: String,
    operations: IndexMap<String, Operation>,
}

impl ApiClient {
    /// Builds a client that dispatches through a `ureq` agent configured
    /// from `options`.
    pub fn new(
        token: &str,
        endpoint: &str,
        definition: &Definition,
        options: RequestOptions,
    ) -> Self {
        let transport = Arc::new(UreqTransport::new(&options));
        Self::with_transport(token, endpoint, definition, options, transport)
    }

    /// Builds a client that dispatches through `transport`.
    pub fn with_transport(
        token: &str,
        endpoint: &str,
        definition: &Definition,
        options: RequestOptions,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let shared = Arc::new(Shared {
            token: token.to_string(),
            endpoint: endpoint.to_string(),
            options,
            transport,
        });
        let operations = definition
            .iter()
            .map(|(name, template)| {
                let op = Operation {
                    name: name.to_string(),
                    template: template.clone(),
                    shared: Arc::clone(&shared),
                };
                (name.to_string(), op)
            })
            .collect();
        Self {
            endpoint: endpoint.to_string(),
            operations,
        }
    }

    /// Loads `version` from `store` and builds a client for it.
    pub fn from_version(
        token: &str,
        endpoint: &str,
        store: &VersionStore,
        version: &str,
        options: RequestOptions,
    ) -> Result<Self, ApiError> {
        let definition = store.load(version)?;
        Ok(Self::new(token, endpoint, &definition, options))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolves an operation by name.
    pub fn call(&self, name: &str) -> Result<&Operation, ApiError> {
        self.operations.get(name).ok_or_else(|| ApiError::UnknownCall {
            name: name.to_string(),
        })
    }

    /// Resolves `name` and invokes it once.
    pub fn invoke(&self, name: &str, args: &CallArgs) -> Result<ResponseEnvelope, ApiError> {
        self.call(name)?.call(args)
    }

    /// Names of every generated operation, in definition order.
    pub fn call_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .field("calls", &self.operations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// State every operation of one client shares read-only.
struct Shared {
    token: String,
    endpoint: String,
    options: RequestOptions,
    transport: Arc<dyn Transport>,
}

/// One named API action bound to the client's token, endpoint and options.
#[derive(Clone)]
pub struct Operation {
    name: String,
    template: CallTemplate,
    shared: Arc<Shared>,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &CallTemplate {
        &self.template
    }

    /// Builds the POST body for `args` without sending anything.
    pub fn build_body(&self, args: &CallArgs) -> Result<PostBody, ApiError> {
        if args.payload().is_some()
            && !self.template.accepts_data()
            && self.shared.options.read_only == ReadOnlyPolicy::Reject
        {
            return Err(ApiError::ReadOnlyViolation {
                call: self.name.clone(),
            });
        }
        build_body(
            &self.name,
            &self.shared.token,
            args.payload(),
            &self.template,
            &args.kwargs,
        )
    }

    /// Builds the request `call` would send, for callers that execute it
    /// themselves.
    pub fn build_request(&self, args: &CallArgs) -> Result<HttpRequest, ApiError> {
        let body = self.build_body(args)?;
        Ok(HttpRequest::form(
            &self.shared.endpoint,
            &body,
            &self.shared.options.headers,
        ))
    }

    /// Sends one POST and returns the response with call metadata.
    #[tracing::instrument(skip_all, fields(call = %self.name))]
    pub fn call(&self, args: &CallArgs) -> Result<ResponseEnvelope, ApiError> {
        let body = self.build_body(args)?;
        let request = HttpRequest::form(&self.shared.endpoint, &body, &self.shared.options.headers);
        tracing::debug!(fields = body.len(), "dispatching");
        let response = self.shared.transport.execute(&request)?;
        tracing::debug!(status = response.status, "response received");
        Ok(enhance(response, &self.name, &self.template, &args.kwargs, &body))
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("endpoint", &self.shared.endpoint)
            .field("token", &"<redacted>")
            .field("template", &self.template)
            .finish()
    }
}
