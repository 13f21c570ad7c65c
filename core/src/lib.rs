//! Definition-driven client for a survey/data-capture HTTP API.
//!
//! # Overview
//! A version file names the API's calls and their default form fields.
//! `ApiClient` reads such a `Definition` and generates one `Operation` per
//! call. Invoking an operation merges the call's template with the token,
//! an optional payload, ad-hoc overrides and list arguments into a flat
//! form body, POSTs it, and returns the raw response with metadata about
//! how the call was built.
//!
//! # Design
//! - Template entries are tagged scalar or list once, when the version file
//!   is loaded.
//! - Every invocation builds its body from its own template copy; clients
//!   and operations are `Send + Sync` and hold no mutable state.
//! - `Operation::build_request` exposes the plain-data request so the host
//!   can run the round-trip itself; `Operation::call` uses the client's
//!   `Transport` (ureq by default).
//! - Responses are not parsed; callers get status, headers and body as sent.
//!
//! ```no_run
//! use cappy_core::{ApiClient, CallArgs, RequestOptions, VersionStore};
//!
//! let store = VersionStore::from_env();
//! let client = ApiClient::from_version(
//!     "F53EA8B9D58456B722945F4B274E6B4C",
//!     "https://redcap.example.org/api/",
//!     &store,
//!     "master.yaml",
//!     RequestOptions::default(),
//! )?;
//! let res = client.invoke("export_records", &CallArgs::new().arg("records", vec![1, 2]))?;
//! println!("{}", res.body());
//! # Ok::<(), cappy_core::ApiError>(())
//! ```

pub mod body;
pub mod client;
pub mod definition;
pub mod envelope;
pub mod error;
pub mod http;
pub mod json;
pub mod options;
pub mod transport;
pub mod versions;

pub use body::{build_body, CallArgs, PostBody, ADHOC_OPTIONS_KEY};
pub use client::{ApiClient, Operation};
pub use definition::{CallTemplate, Definition, TemplateValue};
pub use envelope::{enhance, CallMetadata, ResponseEnvelope};
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse};
pub use json::beautify_json;
pub use options::{ReadOnlyPolicy, RequestOptions};
pub use transport::{Transport, UreqTransport};
pub use versions::VersionStore;
