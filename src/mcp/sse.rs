// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server-sent events transport.
//!
//! `GET /sse` opens a push stream. Its first event, `endpoint`, tells the
//! client where to post: `/messages?sessionId=<id>`. Every later event is a
//! `message` carrying one JSON-RPC response. `POST /messages` accepts one
//! request per call and answers `202 Accepted`; the response itself travels
//! over the stream. A missing, malformed or unknown session id is answered
//! with 400 for that call alone.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::core::constants::{http, jsonrpc};
use crate::core::errors::RoutingError;
use crate::core::models::{JsonRpcRequest, JsonRpcResponse, SessionId};
use crate::core::session::{Session, SessionStore};
use crate::mcp::transport::{OpenedSession, TransportAdapter, TransportContext};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        (status, self.to_string()).into_response()
    }
}

/// Why a `POST /messages` delivery was refused
#[derive(Error, Debug)]
pub enum MessageRejection {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl IntoResponse for MessageRejection {
    fn into_response(self) -> Response {
        match self {
            MessageRejection::Routing(e) => e.into_response(),
            other => (StatusCode::BAD_REQUEST, other.to_string()).into_response(),
        }
    }
}

/// Removes the session from the store when the stream is dropped.
struct SessionGuard {
    sessions: std::sync::Arc<SessionStore>,
    session: Session,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.sessions.release(&self.session) {
            info!(session_id = %self.session.id(), "SSE session closed");
        }
    }
}

/// Build the HTTP router for the SSE transport
pub fn create_router(ctx: TransportContext, body_limit: usize) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            let status = if e.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string())
        }))
        .timeout(REQUEST_TIMEOUT)
        .into_inner();

    Router::new()
        .route(http::SSE_PATH, get(sse_handler))
        .route(http::MESSAGES_PATH, post(message_handler))
        .route(http::HEALTH_PATH, get(health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware_stack)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn sse_handler(
    State(ctx): State<TransportContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let OpenedSession {
        session, outbound, ..
    } = ctx.open_session();
    info!(session_id = %session.id(), "SSE session opened");

    let endpoint = format!(
        "{}?{}={}",
        http::MESSAGES_PATH,
        http::SESSION_ID_QUERY,
        session.id()
    );
    let guard = SessionGuard {
        sessions: ctx.sessions.clone(),
        session,
    };

    let announce = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event(http::ENDPOINT_EVENT).data(endpoint))
    });
    Sse::new(announce.chain(message_stream(outbound, guard)))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

/// Relay outbound responses until the channel closes.
fn message_stream(
    outbound: mpsc::Receiver<JsonRpcResponse>,
    guard: SessionGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let closed = guard.session.channel().cancellation();
    stream::unfold((outbound, closed, guard), |(mut rx, closed, guard)| async move {
        let next = tokio::select! {
            biased;
            _ = closed.cancelled() => None,
            msg = rx.recv() => msg,
        };
        let response = next?;
        let event = Event::default()
            .event(http::MESSAGE_EVENT)
            .json_data(&response)
            .unwrap_or_else(|e| {
                warn!("Failed to encode SSE message: {}", e);
                Event::default().event(http::MESSAGE_EVENT).data(
                    json!({
                        "jsonrpc": jsonrpc::VERSION,
                        "id": response.id,
                        "error": { "code": jsonrpc::ERROR_INTERNAL, "message": "Internal error" }
                    })
                    .to_string(),
                )
            });
        Some((Ok(event), (rx, closed, guard)))
    })
}

async fn message_handler(
    State(ctx): State<TransportContext>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<impl IntoResponse, MessageRejection> {
    let raw = query
        .get(http::SESSION_ID_QUERY)
        .filter(|v| !v.is_empty())
        .ok_or(RoutingError::MissingSessionId)?;
    let id: SessionId = raw
        .parse()
        .map_err(|_| RoutingError::MalformedSessionId(raw.clone()))?;
    let session = ctx.sessions.lookup(&id).map_err(|e| {
        debug!(session_id = %id, "Rejected message for unknown session");
        e
    })?;

    let request: JsonRpcRequest = serde_json::from_slice(&body)
        .map_err(|e| MessageRejection::InvalidMessage(e.to_string()))?;
    session.submit(request).await?;

    Ok((StatusCode::ACCEPTED, "Accepted"))
}

async fn health_handler(State(ctx): State<TransportContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "sessions": ctx.sessions.len(),
    }))
}

/// Serve the SSE router on `listener` until `shutdown` fires.
///
/// Open sessions are closed when shutdown starts so their streams end and
/// graceful shutdown can complete.
pub async fn serve_listener(
    listener: TcpListener,
    ctx: TransportContext,
    body_limit: usize,
    shutdown: CancellationToken,
) -> Result<()> {
    let sessions = ctx.sessions.clone();
    let app = create_router(ctx, body_limit);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            sessions.close_all();
        })
        .await
        .context("SSE server error")?;
    Ok(())
}

/// Push-channel adapter bound to a TCP address
#[derive(Debug, Clone)]
pub struct SseTransport {
    address: String,
    body_limit: usize,
}

impl SseTransport {
    pub fn new(address: impl Into<String>, body_limit: usize) -> Self {
        Self {
            address: address.into(),
            body_limit,
        }
    }
}

#[async_trait]
impl TransportAdapter for SseTransport {
    fn name(&self) -> &'static str {
        "sse"
    }

    async fn serve(self: Box<Self>, ctx: TransportContext, shutdown: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind {}", self.address))?;
        let local = listener.local_addr().context("Failed to read bound address")?;
        info!("SSE transport listening on http://{}{}", local, http::SSE_PATH);
        serve_listener(listener, ctx, self.body_limit, shutdown).await
    }
}
