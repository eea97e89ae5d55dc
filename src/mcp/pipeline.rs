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

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, warn};

use crate::core::constants::jsonrpc;
use crate::core::models::{JsonRpcRequest, JsonRpcResponse};
use crate::mcp::codec::McpCodec;

/// Messages arriving from the pipe client
#[derive(Debug)]
pub enum DownstreamEvent {
    Request(JsonRpcRequest),
    /// Decoded but unusable message, with the error response to send back
    Rejected(JsonRpcResponse),
    /// Unrecoverable framing error; the stream is abandoned
    Error(String),
    /// Client disconnected (EOF)
    Disconnect,
}

/// Classify one raw frame as a request or an error response.
///
/// Returns `None` for frames that need no answer, such as a stray
/// response object from the client.
pub fn classify_frame(frame: &[u8]) -> Option<DownstreamEvent> {
    let value: Value = match serde_json::from_slice(frame) {
        Ok(v) => v,
        Err(e) => {
            warn!("JSON-RPC parse error: {}", e);
            return Some(DownstreamEvent::Rejected(JsonRpcResponse::error(
                Value::Null,
                jsonrpc::ERROR_PARSE,
                format!("Parse error: {}", e),
            )));
        }
    };

    let id = value.get("id").cloned();
    if value.get("method").is_none()
        && (value.get("result").is_some() || value.get("error").is_some())
    {
        debug!("Ignoring response object sent by client");
        return None;
    }

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(req) => Some(DownstreamEvent::Request(req)),
        Err(e) => {
            warn!("Invalid JSON-RPC request: {}", e);
            Some(DownstreamEvent::Rejected(JsonRpcResponse::error(
                id.unwrap_or(Value::Null),
                jsonrpc::ERROR_INVALID_REQUEST,
                format!("Invalid Request: {}", e),
            )))
        }
    }
}

/// Spawns a background task that decodes client input into events
pub fn spawn_downstream_reader<R>(
    stream: R,
    codec: McpCodec,
    tx: mpsc::Sender<DownstreamEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedRead::new(stream, codec);

        while let Some(result) = framed.next().await {
            match result {
                Ok(frame) => {
                    let Some(event) = classify_frame(&frame) else {
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!("Framing error: {}", e);
                    let _ = tx.send(DownstreamEvent::Error(e.to_string())).await;
                    break;
                }
            }
        }
        let _ = tx.send(DownstreamEvent::Disconnect).await;
    })
}

/// Spawns a background task that writes responses until `rx` closes
pub fn spawn_downstream_writer<W>(
    sink: W,
    codec: McpCodec,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedWrite::new(sink, codec);
        while let Some(response) = rx.recv().await {
            if let Err(e) = framed.send(&response).await {
                error!("Failed to write response: {}", e);
                break;
            }
        }
        debug!("Response writer finished");
    })
}
