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

//! Session channels and the session channel store.
//!
//! A `SessionChannel` is the outbound half of one client connection. Closing
//! it cancels its token; anything delivered afterwards is dropped on the
//! floor. The `SessionStore` maps push-channel session ids to live sessions
//! and is the only shared mutable state in the server. Its lock is never
//! held across an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::errors::RoutingError;
use crate::core::models::{JsonRpcRequest, JsonRpcResponse, SessionId};

/// Outbound delivery handle for one connected client
#[derive(Debug, Clone)]
pub struct SessionChannel {
    tx: mpsc::Sender<JsonRpcResponse>,
    closed: CancellationToken,
}

impl SessionChannel {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JsonRpcResponse>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                closed: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Deliver a response. Returns `false` when the channel is already
    /// closed, in which case the response is discarded.
    pub async fn deliver(&self, response: JsonRpcResponse) -> bool {
        if self.closed.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => false,
            sent = self.tx.send(response) => sent.is_ok(),
        }
    }

    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.tx.is_closed()
    }

    /// Token cancelled when the channel closes
    pub fn cancellation(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub fn same_channel(&self, other: &SessionChannel) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

/// Work queued for a session's worker
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A decoded request to run through the protocol engine
    Request(JsonRpcRequest),
    /// A message that failed to decode, answered as-is in arrival order
    Rejected(JsonRpcResponse),
}

/// One connected push-channel client.
///
/// `inbox` feeds the session's worker, which processes requests strictly in
/// arrival order and writes responses to `channel`.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    channel: SessionChannel,
    inbox: mpsc::Sender<Inbound>,
}

impl Session {
    pub fn new(id: SessionId, channel: SessionChannel, inbox: mpsc::Sender<Inbound>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            channel,
            inbox,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn channel(&self) -> &SessionChannel {
        &self.channel
    }

    pub fn close(&self) {
        self.channel.close();
    }

    /// Queue a decoded request for this session's worker.
    pub async fn submit(&self, request: JsonRpcRequest) -> Result<(), RoutingError> {
        if self.channel.is_closed() {
            return Err(RoutingError::SessionClosed(self.id));
        }
        self.inbox
            .send(Inbound::Request(request))
            .await
            .map_err(|_| RoutingError::SessionClosed(self.id))
    }
}

/// Concurrency-safe map from session id to live session
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session. A prior session under the same id is closed before
    /// it is replaced. Returns `true` if a session was superseded.
    pub fn register(&self, session: Session) -> bool {
        let id = session.id();
        let previous = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            sessions.insert(id, session)
        };
        match previous {
            Some(old) => {
                info!(session_id = %id, "Superseding existing session channel");
                old.close();
                true
            }
            None => {
                debug!(session_id = %id, "Session registered");
                false
            }
        }
    }

    pub fn lookup(&self, id: &SessionId) -> Result<Session, RoutingError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| RoutingError::UnknownSession(id.to_string()))
    }

    /// Remove and close a session. Removing an absent id is a no-op.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            sessions.remove(id)
        };
        match removed {
            Some(session) => {
                session.close();
                debug!(session_id = %id, "Session removed");
                true
            }
            None => false,
        }
    }

    /// Remove `session` only if it is still the live entry for its id.
    ///
    /// A stream that outlived a superseding `register` must not tear down
    /// the session that replaced it.
    pub fn release(&self, session: &Session) -> bool {
        let id = session.id();
        let removed = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(&id) {
                Some(current) if current.channel().same_channel(session.channel()) => {
                    sessions.remove(&id)
                }
                _ => None,
            }
        };
        session.close();
        removed.is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close and drop every session, used on shutdown.
    pub fn close_all(&self) {
        let drained: Vec<Session> = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            sessions.drain().map(|(_, s)| s).collect()
        };
        if !drained.is_empty() {
            info!(count = drained.len(), "Closing open sessions");
        }
        for session in drained {
            session.close();
        }
    }
}
