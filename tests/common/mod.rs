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

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gworkspace_mcp::catalog::{CapabilityHandler, ToolRequest};
use gworkspace_mcp::config::Config;
use gworkspace_mcp::core::constants::tools;
use gworkspace_mcp::core::models::{HandlerResult, JsonRpcRequest, ToolContent};
use gworkspace_mcp::mcp::server::WorkspaceServer;
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const ALL_TOOLS: [&str; 10] = [
    tools::LIST_EMAILS,
    tools::SEARCH_EMAILS,
    tools::SEND_EMAIL,
    tools::MODIFY_EMAIL,
    tools::LIST_EVENTS,
    tools::CREATE_EVENT,
    tools::UPDATE_EVENT,
    tools::DELETE_EVENT,
    tools::LIST_CONTACTS,
    tools::GET_USER_INFO,
];

/// Answers every call with "<tool> handled"
pub struct StubHandler {
    pub name: &'static str,
}

#[async_trait]
impl CapabilityHandler for StubHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn invoke(&self, request: ToolRequest) -> HandlerResult {
        Ok(vec![ToolContent::text(format!("{} handled", request.tool_name()))])
    }
}

/// Blocks inside the handler until released
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
    pub finished: AtomicBool,
}

pub struct GatedHandler {
    pub name: &'static str,
    pub gate: Arc<Gate>,
}

#[async_trait]
impl CapabilityHandler for GatedHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn invoke(&self, request: ToolRequest) -> HandlerResult {
        self.gate.entered.notify_one();
        self.gate.release.notified().await;
        self.gate.finished.store(true, Ordering::SeqCst);
        Ok(vec![ToolContent::text(format!("{} released", request.tool_name()))])
    }
}

pub fn stub_handlers() -> Vec<Arc<dyn CapabilityHandler>> {
    ALL_TOOLS
        .iter()
        .copied()
        .map(|name| Arc::new(StubHandler { name }) as Arc<dyn CapabilityHandler>)
        .collect()
}

/// Stubs everywhere except `get_user_info`, which waits on `gate`.
pub fn gated_handlers(gate: Arc<Gate>) -> Vec<Arc<dyn CapabilityHandler>> {
    ALL_TOOLS
        .iter()
        .copied()
        .map(|name| {
            if name == tools::GET_USER_INFO {
                Arc::new(GatedHandler {
                    name,
                    gate: gate.clone(),
                }) as Arc<dyn CapabilityHandler>
            } else {
                Arc::new(StubHandler { name }) as Arc<dyn CapabilityHandler>
            }
        })
        .collect()
}

pub fn stub_server() -> WorkspaceServer {
    WorkspaceServer::new(Config::default(), stub_handlers()).unwrap()
}

pub fn request(method: &str, params: Option<Value>, id: i64) -> JsonRpcRequest {
    JsonRpcRequest::new(method, params, Some(json!(id)))
}

pub fn call(tool: &str, arguments: Value, id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments },
        "id": id
    })
}
