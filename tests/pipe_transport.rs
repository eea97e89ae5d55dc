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

mod common;

use std::time::Duration;

use gworkspace_mcp::core::models::JsonRpcResponse;
use gworkspace_mcp::mcp::server::WorkspaceServer;
use gworkspace_mcp::mcp::sse::SseTransport;
use gworkspace_mcp::mcp::stdio::{PipeState, StdioTransport};
use gworkspace_mcp::mcp::transport::TransportAdapter;
use serde_json::{json, Value};
use tokio::io::{
    AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf,
    WriteHalf,
};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use common::{call, stub_server};

struct PipeClient {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl PipeClient {
    async fn send(&mut self, message: &Value) {
        self.writer
            .write_all(format!("{}\n", message).as_bytes())
            .await
            .unwrap();
    }

    async fn send_raw(&mut self, raw: &[u8]) {
        self.writer.write_all(raw).await.unwrap();
    }

    async fn recv(&mut self) -> JsonRpcResponse {
        let line = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn hang_up(&mut self) {
        self.writer.shutdown().await.unwrap();
    }
}

fn connect(
    server: &WorkspaceServer,
    shutdown: CancellationToken,
) -> (
    PipeClient,
    tokio::sync::watch::Receiver<PipeState>,
    JoinHandle<anyhow::Result<()>>,
) {
    let (client, pipe) = tokio::io::duplex(64 * 1024);
    let (pipe_read, pipe_write) = tokio::io::split(pipe);
    let transport = StdioTransport::new(pipe_read, pipe_write);
    let state = transport.state();
    let serving = tokio::spawn(Box::new(transport).serve(server.context(), shutdown));

    let (client_read, writer) = tokio::io::split(client);
    (
        PipeClient {
            lines: BufReader::new(client_read).lines(),
            writer,
        },
        state,
        serving,
    )
}

#[tokio::test]
async fn test_pipe_state_transitions() {
    let server = stub_server();
    let (client, pipe) = tokio::io::duplex(1024);
    let (pipe_read, pipe_write) = tokio::io::split(pipe);
    let transport = StdioTransport::new(pipe_read, pipe_write);
    let mut state = transport.state();
    assert_eq!(*state.borrow(), PipeState::Unconnected);

    let serving = tokio::spawn(Box::new(transport).serve(server.context(), CancellationToken::new()));
    timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == PipeState::Connected),
    )
    .await
    .unwrap()
    .unwrap();

    drop(client);
    timeout(Duration::from_secs(5), serving)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), PipeState::Closed);
}

#[tokio::test]
async fn test_pipe_answers_in_arrival_order() {
    let server = stub_server();
    let (mut client, _state, serving) = connect(&server, CancellationToken::new());

    client
        .send(&json!({"jsonrpc": "2.0", "method": "initialize", "params": {"protocolVersion": "2024-11-05"}, "id": 1}))
        .await;
    client.send(&json!({"jsonrpc": "2.0", "method": "tools/list", "id": 2})).await;
    client
        .send(&call("send_email", json!({"accessToken": "t", "to": "a@b.c", "subject": "s", "body": "b"}), 3))
        .await;
    client.send(&json!({"jsonrpc": "2.0", "method": "ping", "id": 4})).await;

    let init = client.recv().await;
    assert_eq!(init.id, json!(1));
    let init = init.result.unwrap();
    assert_eq!(init["protocolVersion"], "2024-11-05");
    assert_eq!(init["serverInfo"]["name"], "google-workspace-server");

    let list = client.recv().await;
    assert_eq!(list.id, json!(2));
    assert_eq!(list.result.unwrap()["tools"].as_array().unwrap().len(), 10);

    let sent = client.recv().await;
    assert_eq!(sent.id, json!(3));
    assert_eq!(sent.result.unwrap()["content"][0]["text"], "send_email handled");

    assert_eq!(client.recv().await.id, json!(4));

    client.hang_up().await;
    timeout(Duration::from_secs(5), serving)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_pipe_answers_malformed_input_and_keeps_going() {
    let server = stub_server();
    let (mut client, _state, _serving) = connect(&server, CancellationToken::new());

    client.send_raw(b"this is not json\n").await;
    client.send(&json!({"jsonrpc": "2.0", "id": 5})).await;
    client.send(&json!({"jsonrpc": "2.0", "method": "ping", "id": 6})).await;

    let parse = client.recv().await;
    assert_eq!(parse.id, Value::Null);
    assert_eq!(parse.error.unwrap().code, -32700);

    let invalid = client.recv().await;
    assert_eq!(invalid.id, json!(5));
    assert_eq!(invalid.error.unwrap().code, -32600);

    let ping = client.recv().await;
    assert_eq!(ping.id, json!(6));
    assert!(ping.error.is_none());
}

#[tokio::test]
async fn test_pipe_mirrors_content_length_framing() {
    let server = stub_server();
    let (client, pipe) = tokio::io::duplex(64 * 1024);
    let (pipe_read, pipe_write) = tokio::io::split(pipe);
    let transport = Box::new(StdioTransport::new(pipe_read, pipe_write));
    let _serving = tokio::spawn(transport.serve(server.context(), CancellationToken::new()));
    let (mut client_read, mut client_write) = tokio::io::split(client);

    let body = json!({"jsonrpc": "2.0", "method": "ping", "id": 1}).to_string();
    client_write
        .write_all(format!("Content-Length: {}\r\n\r\n{}", body.len(), body).as_bytes())
        .await
        .unwrap();

    let mut buf = vec![0u8; 4096];
    let mut received = String::new();
    while !received.contains("\r\n\r\n") || !received.trim_end().ends_with('}') {
        let n = timeout(Duration::from_secs(5), client_read.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert!(n > 0, "pipe closed early");
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }

    let (head, payload) = received.split_once("\r\n\r\n").unwrap();
    assert!(head.to_lowercase().starts_with("content-length:"));
    let response: JsonRpcResponse = serde_json::from_str(payload).unwrap();
    assert_eq!(response.id, json!(1));
}

#[tokio::test]
async fn test_unknown_tool_over_pipe_is_method_not_found() {
    let server = stub_server();
    let (mut client, _state, _serving) = connect(&server, CancellationToken::new());

    client.send(&call("delete_everything", json!({}), 11)).await;
    let response = client.recv().await;
    let error = response.error.unwrap();
    assert_eq!(error.code, -32601);
    assert_eq!(error.message, "Unknown tool: delete_everything");
}

#[tokio::test]
async fn test_shutdown_closes_pipe() {
    let server = stub_server();
    let shutdown = CancellationToken::new();
    let (_client, mut state, serving) = connect(&server, shutdown.clone());
    timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == PipeState::Connected),
    )
    .await
    .unwrap()
    .unwrap();

    shutdown.cancel();
    timeout(Duration::from_secs(5), serving)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), PipeState::Closed);
}

#[tokio::test]
async fn test_pipe_hangup_leaves_sse_running_in_combined_mode() {
    let server = stub_server();
    let shutdown = CancellationToken::new();
    let (client, pipe) = tokio::io::duplex(1024);
    let (pipe_read, pipe_write) = tokio::io::split(pipe);
    let transports: Vec<Box<dyn TransportAdapter>> = vec![
        Box::new(StdioTransport::new(pipe_read, pipe_write)),
        Box::new(SseTransport::new("127.0.0.1:0", 64 * 1024)),
    ];

    let sessions = server.sessions();
    let run = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.run_transports(transports, shutdown).await })
    };

    drop(client);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!run.is_finished());

    shutdown.cancel();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(sessions.is_empty());
}
