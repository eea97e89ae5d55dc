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

//! Process-wide server object.
//!
//! Owns the session store and the protocol engine, and runs the configured
//! transports side by side:
//! - `stdio`: the pipe adapter alone; the process ends when the client hangs up.
//! - `sse`: the HTTP push-channel adapter alone.
//! - `both`: the two together over one engine and one store.
//!
//! A transport that fails cancels its siblings. Every open session is closed
//! before `run` returns.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::catalog::dispatch::{CapabilityHandler, DispatchTable};
use crate::catalog::registry::Catalog;
use crate::config::Config;
use crate::core::errors::ServerError;
use crate::core::session::SessionStore;
use crate::handlers::{workspace_handlers, WorkspaceClient};
use crate::mcp::engine::ProtocolEngine;
use crate::mcp::sse::SseTransport;
use crate::mcp::stdio::StdioTransport;
use crate::mcp::transport::{TransportAdapter, TransportContext};

pub struct WorkspaceServer {
    config: Config,
    engine: Arc<ProtocolEngine>,
    sessions: Arc<SessionStore>,
}

impl WorkspaceServer {
    /// Bind `handlers` to the workspace catalog. Fails on any binding mismatch.
    pub fn new(
        config: Config,
        handlers: Vec<Arc<dyn CapabilityHandler>>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let dispatch = DispatchTable::build(Catalog::workspace(), handlers)?;
        Ok(Self {
            config,
            engine: Arc::new(ProtocolEngine::new(dispatch)),
            sessions: Arc::new(SessionStore::new()),
        })
    }

    /// Server backed by the real Google Workspace handlers
    pub fn with_workspace_handlers(config: Config) -> Result<Self, ServerError> {
        let client = Arc::new(WorkspaceClient::from_config(&config)?);
        Self::new(config, workspace_handlers(client))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> Arc<ProtocolEngine> {
        self.engine.clone()
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    pub fn context(&self) -> TransportContext {
        TransportContext::new(
            self.engine.clone(),
            self.sessions.clone(),
            self.config.session_buffer,
        )
    }

    /// Adapters selected by the configured transport mode
    pub fn transports(&self) -> Vec<Box<dyn TransportAdapter>> {
        let mut transports: Vec<Box<dyn TransportAdapter>> = Vec::new();
        if self.config.transport.runs_stdio() {
            transports.push(Box::new(StdioTransport::stdio()));
        }
        if self.config.transport.runs_sse() {
            transports.push(Box::new(SseTransport::new(
                self.config.socket_address(),
                self.config.body_size_limit_bytes,
            )));
        }
        transports
    }

    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.run_transports(self.transports(), shutdown).await
    }

    /// Run `transports` until all have finished.
    pub async fn run_transports(
        &self,
        transports: Vec<Box<dyn TransportAdapter>>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!(
            "Starting {} v{} ({} tools)",
            crate::core::constants::server::NAME,
            env!("CARGO_PKG_VERSION"),
            self.engine.dispatch().catalog().len()
        );

        let tasks = transports.into_iter().map(|transport| {
            let ctx = self.context();
            let shutdown = shutdown.clone();
            async move {
                let name = transport.name();
                let result = transport.serve(ctx, shutdown.clone()).await;
                match &result {
                    Ok(()) => info!("{} transport stopped", name),
                    Err(e) => {
                        error!("{} transport failed: {:#}", name, e);
                        shutdown.cancel();
                    }
                }
                result
            }
        });

        let results = join_all(tasks).await;
        self.sessions.close_all();
        results.into_iter().collect::<Result<Vec<()>>>()?;
        Ok(())
    }
}
