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

//! Pipe transport.
//!
//! One implicit session bound to a byte stream pair, normally stdin and
//! stdout. State goes `Unconnected -> Connected -> Closed` exactly once.

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, Stdin, Stdout};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::session::Inbound;
use crate::mcp::codec::McpCodec;
use crate::mcp::pipeline::{spawn_downstream_reader, spawn_downstream_writer, DownstreamEvent};
use crate::mcp::transport::{TransportAdapter, TransportContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    Unconnected,
    Connected,
    Closed,
}

pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
    state: watch::Sender<PipeState>,
}

impl StdioTransport<Stdin, Stdout> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        let (state, _) = watch::channel(PipeState::Unconnected);
        Self {
            reader,
            writer,
            state,
        }
    }

    /// Observe state transitions
    pub fn state(&self) -> watch::Receiver<PipeState> {
        self.state.subscribe()
    }

    async fn run(self, ctx: TransportContext, shutdown: CancellationToken) -> Result<()> {
        let Self {
            reader,
            writer,
            state,
        } = self;

        let codec = McpCodec::new();
        let (channel, inbox, outbound, worker) = ctx.open_channel("stdio");
        let writer_task = spawn_downstream_writer(writer, codec.clone(), outbound);
        let (events_tx, mut events) = mpsc::channel(ctx.session_buffer.max(1));
        let reader_task = spawn_downstream_reader(reader, codec, events_tx);

        state.send_replace(PipeState::Connected);
        info!("Pipe transport connected");

        let mut interrupted = false;
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    interrupted = true;
                    break;
                }
                event = events.recv() => event,
            };

            let inbound = match event {
                Some(DownstreamEvent::Request(request)) => Inbound::Request(request),
                Some(DownstreamEvent::Rejected(response)) => Inbound::Rejected(response),
                Some(DownstreamEvent::Error(e)) => {
                    warn!("Pipe input unreadable: {}", e);
                    continue;
                }
                Some(DownstreamEvent::Disconnect) | None => {
                    info!("Pipe client disconnected");
                    break;
                }
            };

            let sent = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    interrupted = true;
                    break;
                }
                sent = inbox.send(inbound) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        state.send_replace(PipeState::Closed);
        reader_task.abort();
        drop(inbox);

        if interrupted {
            // Best-effort close: responses not yet produced are dropped.
            info!("Pipe transport closing on shutdown");
            channel.close();
            worker.abort();
        }
        drop(channel);

        let _ = worker.await;
        let _ = writer_task.await;
        debug!("Pipe transport closed");
        Ok(())
    }
}

#[async_trait]
impl<R, W> TransportAdapter for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "stdio"
    }

    async fn serve(self: Box<Self>, ctx: TransportContext, shutdown: CancellationToken) -> Result<()> {
        (*self).run(ctx, shutdown).await
    }
}
