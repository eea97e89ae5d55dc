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

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use gworkspace_mcp::config::Config;
use gworkspace_mcp::core::errors::RoutingError;
use gworkspace_mcp::mcp::server::WorkspaceServer;
use serde_json::json;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::timeout;

use common::{gated_handlers, request, stub_server, Gate};

#[tokio::test]
async fn test_response_for_closed_session_is_discarded() {
    let gate = Arc::new(Gate::default());
    let server = WorkspaceServer::new(Config::default(), gated_handlers(gate.clone())).unwrap();
    let ctx = server.context();
    let opened = ctx.open_session();
    let id = opened.session.id();

    opened
        .session
        .submit(request(
            "tools/call",
            Some(json!({"name": "get_user_info", "arguments": {"accessToken": "t"}})),
            1,
        ))
        .await
        .unwrap();
    timeout(Duration::from_secs(5), gate.entered.notified())
        .await
        .unwrap();

    // Client goes away while the call is still running.
    assert!(ctx.sessions.remove(&id));
    assert!(opened.session.channel().is_closed());
    gate.release.notify_one();

    timeout(Duration::from_secs(5), opened.worker)
        .await
        .unwrap()
        .unwrap();
    assert!(gate.finished.load(Ordering::SeqCst));

    let mut outbound = opened.outbound;
    assert!(matches!(
        outbound.try_recv(),
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected)
    ));
}

#[tokio::test]
async fn test_closed_session_refuses_new_messages() {
    let server = stub_server();
    let ctx = server.context();
    let opened = ctx.open_session();
    let id = opened.session.id();

    ctx.sessions.remove(&id);

    assert!(matches!(
        ctx.sessions.lookup(&id),
        Err(RoutingError::UnknownSession(_))
    ));
    let late = opened.session.submit(request("ping", None, 9)).await;
    assert!(matches!(late, Err(RoutingError::SessionClosed(_))));
}

#[tokio::test]
async fn test_requests_within_a_session_are_answered_in_order() {
    let server = stub_server();
    let ctx = server.context();
    let mut opened = ctx.open_session();

    for id in 1..=5 {
        let params = json!({"name": "list_contacts", "arguments": {"accessToken": "t"}});
        opened
            .session
            .submit(request("tools/call", Some(params), id))
            .await
            .unwrap();
    }

    for id in 1..=5 {
        let response = timeout(Duration::from_secs(5), opened.outbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.id, json!(id));
    }
}

#[tokio::test]
async fn test_notifications_produce_no_response() {
    let server = stub_server();
    let ctx = server.context();
    let mut opened = ctx.open_session();

    let notification = gworkspace_mcp::core::models::JsonRpcRequest::new(
        "notifications/initialized",
        None,
        None,
    );
    opened.session.submit(notification).await.unwrap();
    opened.session.submit(request("ping", None, 2)).await.unwrap();

    let response = timeout(Duration::from_secs(5), opened.outbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.id, json!(2));
    assert_eq!(response.result, Some(json!({})));
}

#[tokio::test]
async fn test_one_session_closing_leaves_others_running() {
    let server = stub_server();
    let ctx = server.context();
    let first = ctx.open_session();
    let mut second = ctx.open_session();
    assert_eq!(ctx.sessions.len(), 2);

    ctx.sessions.remove(&first.session.id());
    assert_eq!(ctx.sessions.len(), 1);

    second.session.submit(request("ping", None, 1)).await.unwrap();
    let response = timeout(Duration::from_secs(5), second.outbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.id, json!(1));
}

#[tokio::test]
async fn test_close_all_stops_every_worker() {
    let server = stub_server();
    let ctx = server.context();
    let a = ctx.open_session();
    let b = ctx.open_session();

    ctx.sessions.close_all();
    assert!(ctx.sessions.is_empty());

    timeout(Duration::from_secs(5), a.worker).await.unwrap().unwrap();
    timeout(Duration::from_secs(5), b.worker).await.unwrap().unwrap();
}
