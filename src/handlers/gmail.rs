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

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::future::try_join_all;
use serde_json::{json, Value};

use super::{endpoint_url, WorkspaceClient};
use crate::catalog::request::{ListEmailsArgs, ModifyEmailArgs, SearchEmailsArgs, SendEmailArgs};
use crate::core::constants::google;
use crate::core::errors::HandlerError;
use crate::core::models::{HandlerResult, ToolContent};

const METADATA_HEADERS: [&str; 3] = ["Subject", "From", "Date"];

pub async fn list_emails(client: &WorkspaceClient, args: ListEmailsArgs) -> HandlerResult {
    let summaries = fetch_messages(
        client,
        &args.access_token,
        args.query.as_deref(),
        args.max_results,
        "list emails",
    )
    .await?;
    Ok(vec![ToolContent::json(&summaries)])
}

pub async fn search_emails(client: &WorkspaceClient, args: SearchEmailsArgs) -> HandlerResult {
    let summaries = fetch_messages(
        client,
        &args.access_token,
        Some(args.query.as_str()),
        args.max_results,
        "search emails",
    )
    .await?;
    Ok(vec![ToolContent::json(&summaries)])
}

pub async fn send_email(client: &WorkspaceClient, args: SendEmailArgs) -> HandlerResult {
    let raw = URL_SAFE_NO_PAD.encode(compose_message(&args));
    let url = format!("{}/messages/send", client.endpoints().gmail_base_url);
    let request = client
        .http()
        .post(url)
        .bearer_auth(&args.access_token)
        .json(&json!({ "raw": raw }));
    let sent = client.fetch_json("send email", request).await?;
    Ok(vec![ToolContent::json(&sent)])
}

pub async fn modify_email(client: &WorkspaceClient, args: ModifyEmailArgs) -> HandlerResult {
    let url = endpoint_url(
        "modify email",
        &client.endpoints().gmail_base_url,
        &["messages", args.id.as_str(), "modify"],
    )?;
    let body = json!({
        "addLabelIds": args.add_labels.unwrap_or_default(),
        "removeLabelIds": args.remove_labels.unwrap_or_default(),
    });
    let request = client
        .http()
        .post(url)
        .bearer_auth(&args.access_token)
        .json(&body);
    let modified = client.fetch_json("modify email", request).await?;
    Ok(vec![ToolContent::json(&modified)])
}

/// List message ids, then fetch Subject/From/Date metadata for each.
async fn fetch_messages(
    client: &WorkspaceClient,
    token: &str,
    query: Option<&str>,
    max_results: Option<u32>,
    action: &'static str,
) -> Result<Value, HandlerError> {
    let base = &client.endpoints().gmail_base_url;
    let max_results = max_results.unwrap_or(google::DEFAULT_MAX_RESULTS).to_string();
    let mut params = vec![("maxResults", max_results)];
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        params.push(("q", q.to_string()));
    }

    let request = client
        .http()
        .get(format!("{}/messages", base))
        .bearer_auth(token)
        .query(&params);
    let listing = client.fetch_json(action, request).await?;

    let ids: Vec<String> = listing
        .get("messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let urls = ids
        .iter()
        .map(|id| endpoint_url(action, base, &["messages", id.as_str()]))
        .collect::<Result<Vec<_>, _>>()?;

    let mut query: Vec<(&str, &str)> = vec![("format", "metadata")];
    query.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
    let details = try_join_all(urls.into_iter().map(|url| {
        let request = client.http().get(url).bearer_auth(token).query(&query);
        client.fetch_json(action, request)
    }))
    .await?;

    Ok(Value::Array(details.iter().map(summarize).collect()))
}

fn summarize(message: &Value) -> Value {
    let header = |name: &str| -> Value {
        message
            .pointer("/payload/headers")
            .and_then(Value::as_array)
            .and_then(|headers| {
                headers.iter().find(|h| {
                    h.get("name")
                        .and_then(Value::as_str)
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
                })
            })
            .and_then(|h| h.get("value").cloned())
            .unwrap_or_else(|| json!(""))
    };

    json!({
        "id": message.get("id").cloned().unwrap_or(Value::Null),
        "threadId": message.get("threadId").cloned().unwrap_or(Value::Null),
        "subject": header("Subject"),
        "from": header("From"),
        "date": header("Date"),
        "snippet": message.get("snippet").cloned().unwrap_or_else(|| json!("")),
    })
}

/// RFC 822 message with an HTML body
fn compose_message(args: &SendEmailArgs) -> String {
    let mut lines = vec![format!("To: {}", args.to)];
    if let Some(cc) = args.cc.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("Cc: {}", cc));
    }
    if let Some(bcc) = args.bcc.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("Bcc: {}", bcc));
    }
    lines.push(format!("Subject: {}", args.subject));
    lines.push("MIME-Version: 1.0".to_string());
    lines.push("Content-Type: text/html; charset=utf-8".to_string());
    lines.push(String::new());
    lines.push(args.body.clone());
    lines.join("\r\n")
}
