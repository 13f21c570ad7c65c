//! In-memory imitation of the survey API's single form endpoint.
//!
//! Every call is a form POST to `/api/`. Requests carrying the wrong token
//! get a 403 like the real service. Accepted requests are logged and echoed
//! back as JSON so tests can see exactly which fields arrived.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Request header whose value is copied into `Echo::echo_header`.
pub const ECHO_HEADER: &str = "x-cappy-echo";

pub const FORBIDDEN_MESSAGE: &str = "You do not have permissions to use the API";

/// Body of every accepted request's response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub content: Option<String>,
    pub fields: Vec<(String, String)>,
    pub echo_header: Option<String>,
}

impl Echo {
    /// First value sent under `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

pub type Received = Arc<RwLock<Vec<Vec<(String, String)>>>>;

#[derive(Clone)]
struct AppState {
    token: Arc<str>,
    received: Received,
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        received: Received::default(),
    };
    Router::new()
        .route("/api/", post(api_call))
        .route("/_received", get(list_received))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn api_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Json<Echo>, (StatusCode, Json<ApiErrorBody>)> {
    let token = fields.iter().find(|(k, _)| k == "token").map(|(_, v)| v.as_str());
    if token != Some(&*state.token) {
        tracing::info!("rejected request with bad token");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiErrorBody {
                error: FORBIDDEN_MESSAGE.to_string(),
            }),
        ));
    }

    let content = fields
        .iter()
        .find(|(k, _)| k == "content")
        .map(|(_, v)| v.clone());
    let echo_header = headers
        .get(ECHO_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    tracing::info!(content = ?content, fields = fields.len(), "accepted request");

    state.received.write().await.push(fields.clone());
    Ok(Json(Echo {
        content,
        fields,
        echo_header,
    }))
}

async fn list_received(State(state): State<AppState>) -> Json<Vec<Vec<(String, String)>>> {
    Json(state.received.read().await.clone())
}
