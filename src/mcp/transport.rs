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

//! Transport adapter abstraction.
//!
//! Every transport hands decoded requests to a per-session worker and lets
//! it write responses back through that session's channel. The worker is
//! the only place requests meet the `ProtocolEngine`, so adding a transport
//! never duplicates routing.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::models::{JsonRpcResponse, SessionId};
use crate::core::session::{Inbound, Session, SessionChannel, SessionStore};
use crate::mcp::engine::ProtocolEngine;

/// A way for clients to reach the protocol engine
#[async_trait]
pub trait TransportAdapter: Send {
    fn name(&self) -> &'static str;

    /// Serve until the transport ends on its own or `shutdown` fires.
    async fn serve(self: Box<Self>, ctx: TransportContext, shutdown: CancellationToken)
        -> Result<()>;
}

/// Shared state handed to every transport
#[derive(Debug, Clone)]
pub struct TransportContext {
    pub engine: Arc<ProtocolEngine>,
    pub sessions: Arc<SessionStore>,
    pub session_buffer: usize,
}

/// Receiving ends of a freshly opened session
#[derive(Debug)]
pub struct OpenedSession {
    pub session: Session,
    pub outbound: mpsc::Receiver<JsonRpcResponse>,
    pub worker: JoinHandle<()>,
}

impl TransportContext {
    pub fn new(engine: Arc<ProtocolEngine>, sessions: Arc<SessionStore>, session_buffer: usize) -> Self {
        Self {
            engine,
            sessions,
            session_buffer,
        }
    }

    /// Channel plus worker for a session that lives outside the store.
    pub fn open_channel(
        &self,
        label: &str,
    ) -> (
        SessionChannel,
        mpsc::Sender<Inbound>,
        mpsc::Receiver<JsonRpcResponse>,
        JoinHandle<()>,
    ) {
        let (channel, outbound) = SessionChannel::new(self.session_buffer);
        let (inbox, inbox_rx) = mpsc::channel(self.session_buffer.max(1));
        let worker = spawn_session_worker(
            self.engine.clone(),
            inbox_rx,
            channel.clone(),
            label.to_string(),
        );
        (channel, inbox, outbound, worker)
    }

    /// Mint an id, start a worker and register the session in the store.
    pub fn open_session(&self) -> OpenedSession {
        let id = SessionId::generate();
        let (channel, inbox, outbound, worker) = self.open_channel(&id.to_string());
        let session = Session::new(id, channel, inbox);
        self.sessions.register(session.clone());
        OpenedSession {
            session,
            outbound,
            worker,
        }
    }
}

/// One logical worker per session: requests are taken in arrival order and
/// each response is delivered before the next request starts.
///
/// Closing the channel stops the worker from taking new work. A request
/// already inside the engine runs to completion and its response is dropped.
pub fn spawn_session_worker(
    engine: Arc<ProtocolEngine>,
    mut inbox: mpsc::Receiver<Inbound>,
    channel: SessionChannel,
    label: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let closed = channel.cancellation();
        loop {
            let next = tokio::select! {
                biased;
                _ = closed.cancelled() => break,
                next = inbox.recv() => next,
            };
            let Some(inbound) = next else {
                break;
            };

            let response = match inbound {
                Inbound::Request(request) => engine.handle(request).await,
                Inbound::Rejected(response) => Some(response),
            };
            if let Some(response) = response {
                if !channel.deliver(response).await {
                    debug!(session = %label, "Discarding response for closed session");
                }
            }
        }
        debug!(session = %label, "Session worker stopped");
    })
}
