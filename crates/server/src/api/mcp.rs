//! MCP over HTTP: plain JSON-RPC POST plus SSE sessions.

use crate::middleware::{require_token, FixedTokenAuth};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use identity_mcp::protocol::JsonRpcResponse;
use identity_mcp::McpServer;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type SessionSender = mpsc::UnboundedSender<JsonRpcResponse>;

/// Open SSE sessions, keyed by session id
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionSender>>>,
}

impl SessionRegistry {
    pub fn open(&self) -> (String, mpsc::UnboundedReceiver<JsonRpcResponse>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), tx);
        (id, rx)
    }

    pub fn sender(&self, id: &str) -> Option<SessionSender> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &str) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes the session when the SSE stream is dropped
struct SessionGuard {
    sessions: SessionRegistry,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        info!(session_id = %self.id, "MCP SSE session closed");
    }
}

#[derive(Clone)]
pub struct McpTransportState {
    server: McpServer,
    sessions: SessionRegistry,
    base_path: String,
}

impl McpTransportState {
    pub fn new(server: McpServer, base_path: impl Into<String>) -> Self {
        Self {
            server,
            sessions: SessionRegistry::default(),
            base_path: base_path.into(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

/// MCP routes under `base_path`, all behind the token middleware
pub fn router(state: McpTransportState, auth: Arc<FixedTokenAuth>) -> Router {
    let base = state.base_path.clone();
    let root = if base.is_empty() { "/".to_string() } else { base.clone() };

    Router::new()
        .route(&root, post(handle_post))
        .route(&format!("{base}/sse"), get(handle_sse))
        .route(&format!("{base}/message"), post(handle_session_message))
        .route_layer(from_fn_with_state(auth, require_token))
        .with_state(Arc::new(state))
}

/// `POST {base}`: one JSON-RPC message in, its response out
async fn handle_post(State(state): State<Arc<McpTransportState>>, body: String) -> Response {
    match state.server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// `GET {base}/sse`: opens a session; responses arrive as `message` events
async fn handle_sse(
    State(state): State<Arc<McpTransportState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, mut rx) = state.sessions.open();
    info!(session_id = %id, "MCP SSE session opened");

    let endpoint = format!("{}/message?sessionId={}", state.base_path, id);
    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint));

        while let Some(response) = rx.recv().await {
            match serde_json::to_string(&response) {
                Ok(json) => yield Ok(Event::default().event("message").data(json)),
                Err(e) => warn!(error = %e, "Failed to serialize MCP response"),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionQuery {
    session_id: String,
}

/// `POST {base}/message?sessionId=`: accepted here, answered on the stream
async fn handle_session_message(
    State(state): State<Arc<McpTransportState>>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(sender) = state.sessions.sender(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    if let Some(response) = state.server.handle_message(&body).await {
        if sender.send(response).is_err() {
            debug!(session_id = %query.session_id, "MCP SSE session went away");
            state.sessions.remove(&query.session_id);
            return (StatusCode::NOT_FOUND, "Session not found").into_response();
        }
    }

    StatusCode::ACCEPTED.into_response()
}
