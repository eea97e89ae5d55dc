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

//! Protocol engine.
//!
//! Transport-agnostic: takes one decoded request and produces at most one
//! response. It never sees sessions or channels; the adapter that handed
//! the request in delivers whatever comes back.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::catalog::dispatch::DispatchTable;
use crate::catalog::registry::Catalog;
use crate::core::constants::{jsonrpc, methods, server};
use crate::core::models::{JsonRpcRequest, JsonRpcResponse};

#[derive(Debug)]
pub struct ProtocolEngine {
    dispatch: DispatchTable,
    tools: Value,
}

impl ProtocolEngine {
    pub fn new(dispatch: DispatchTable) -> Self {
        let tools = Self::render_tools(dispatch.catalog());
        Self { dispatch, tools }
    }

    fn render_tools(catalog: &Catalog) -> Value {
        serde_json::to_value(catalog.list()).unwrap_or_else(|_| json!([]))
    }

    /// The `tools/list` payload, in catalog order
    pub fn list_tools(&self) -> &Value {
        &self.tools
    }

    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Route one request. Notifications yield `None`.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != jsonrpc::VERSION {
            return request.id.map(|id| {
                JsonRpcResponse::error(
                    id,
                    jsonrpc::ERROR_INVALID_REQUEST,
                    format!(
                        "Invalid Request: expected jsonrpc '{}', got '{}'",
                        jsonrpc::VERSION,
                        request.jsonrpc
                    ),
                )
            });
        }

        let Some(id) = request.id.clone() else {
            debug!("Notification received: {}", request.method);
            return None;
        };

        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                JsonRpcResponse::success(id, self.initialize(request.params.as_ref()))
            }
            methods::PING => JsonRpcResponse::success(id, json!({})),
            methods::TOOLS_LIST => JsonRpcResponse::success(id, json!({ "tools": self.tools })),
            methods::TOOLS_CALL => self.call_tool(id, request.params).await,
            other => JsonRpcResponse::error(
                id,
                jsonrpc::ERROR_METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = requested
            .filter(|v| server::SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(server::DEFAULT_PROTOCOL_VERSION);
        info!(
            requested = requested.unwrap_or("none"),
            negotiated = version,
            "Client initialized"
        );

        json!({
            "protocolVersion": version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": server::NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(Value::Object(mut params)) = params else {
            return JsonRpcResponse::error(
                id,
                jsonrpc::ERROR_INVALID_PARAMS,
                "Invalid params: expected an object with 'name'",
            );
        };
        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => {
                return JsonRpcResponse::error(
                    id,
                    jsonrpc::ERROR_INVALID_PARAMS,
                    "Invalid params: missing tool name",
                )
            }
        };
        let arguments = params.remove("arguments").unwrap_or(Value::Null);

        debug!("Calling tool {}", name);
        match self.dispatch.invoke(&name, arguments).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(
                    id,
                    jsonrpc::ERROR_INTERNAL,
                    format!("Internal error: {}", e),
                ),
            },
            Err(fault) => JsonRpcResponse::error(id, fault.code(), fault.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::dispatch::CapabilityHandler;
    use crate::catalog::request::ToolRequest;
    use crate::core::constants::tools;
    use crate::core::models::{HandlerResult, ToolContent};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl CapabilityHandler for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn invoke(&self, request: ToolRequest) -> HandlerResult {
            Ok(vec![ToolContent::text(format!("ran {}", request.tool_name()))])
        }
    }

    fn engine() -> ProtocolEngine {
        let handlers: Vec<Arc<dyn CapabilityHandler>> = Catalog::workspace()
            .list()
            .iter()
            .map(|t| Arc::new(Named(t.name)) as Arc<dyn CapabilityHandler>)
            .collect();
        ProtocolEngine::new(DispatchTable::build(Catalog::workspace(), handlers).unwrap())
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(method, Some(params), Some(json!(1)))
    }

    #[tokio::test]
    async fn test_tools_list_in_catalog_order() {
        let resp = engine().handle(request("tools/list", json!({}))).await.unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 10);
        assert_eq!(tools[0]["name"], tools::LIST_EMAILS);
        assert_eq!(tools[9]["name"], tools::GET_USER_INFO);
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let resp = engine()
            .handle(request(
                "tools/call",
                json!({"name": "get_user_info", "arguments": {"accessToken": "X"}}),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["content"][0]["text"], "ran get_user_info");
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let resp = engine()
            .handle(request("tools/call", json!({"name": "rm_rf", "arguments": {}})))
            .await
            .unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Unknown tool: rm_rf");
    }

    #[tokio::test]
    async fn test_missing_tool_name_is_invalid_params() {
        let resp = engine()
            .handle(request("tools/call", json!({"arguments": {}})))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_initialize_negotiates_version() {
        let e = engine();
        let known = e
            .handle(request("initialize", json!({"protocolVersion": "2025-03-26"})))
            .await
            .unwrap();
        assert_eq!(known.result.unwrap()["protocolVersion"], "2025-03-26");

        let unknown = e
            .handle(request("initialize", json!({"protocolVersion": "1999-01-01"})))
            .await
            .unwrap();
        let result = unknown.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "google-workspace-server");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let note = JsonRpcRequest::new("notifications/initialized", None, None);
        assert!(engine().handle(note).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_version() {
        let e = engine();
        let resp = e.handle(request("resources/list", json!({}))).await.unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);

        let mut bad = request("ping", json!({}));
        bad.jsonrpc = "1.0".to_string();
        assert_eq!(e.handle(bad).await.unwrap().error.unwrap().code, -32600);
    }
}
