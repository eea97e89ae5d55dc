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

//! Google Workspace capability handlers.
//!
//! Stateless outbound calls. Every handler authenticates with the caller's
//! `accessToken` as a bearer token, maps a non-2xx answer to
//! `HandlerError::Upstream` and returns the JSON payload as one pretty
//! printed text block.

pub mod calendar;
pub mod gmail;
pub mod people;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::catalog::dispatch::CapabilityHandler;
use crate::catalog::request::ToolRequest;
use crate::config::Config;
use crate::core::constants::{google, tools};
use crate::core::errors::{HandlerError, ServerError};
use crate::core::models::HandlerResult;

/// Base URLs of the Google APIs the handlers talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub gmail_base_url: String,
    pub calendar_base_url: String,
    pub people_base_url: String,
    pub userinfo_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gmail_base_url: google::GMAIL_BASE_URL.to_string(),
            calendar_base_url: google::CALENDAR_BASE_URL.to_string(),
            people_base_url: google::PEOPLE_BASE_URL.to_string(),
            userinfo_url: google::USERINFO_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every API at one base URL. Used against local mock servers.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            gmail_base_url: format!("{}/gmail/v1/users/me", base),
            calendar_base_url: format!("{}/calendar/v3", base),
            people_base_url: format!("{}/v1", base),
            userinfo_url: format!("{}/oauth2/v2/userinfo", base),
        }
    }
}

/// Shared HTTP client for all workspace handlers
#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    http: Client,
    endpoints: Endpoints,
}

impl WorkspaceClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ServerError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                ServerError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { http, endpoints })
    }

    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let endpoints = Endpoints {
            gmail_base_url: config.gmail_base_url.clone(),
            calendar_base_url: config.calendar_base_url.clone(),
            people_base_url: config.people_base_url.clone(),
            userinfo_url: config.userinfo_url.clone(),
        };
        Self::new(endpoints, Duration::from_secs(config.http_timeout_secs))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Send `request` and decode a JSON body. An empty 2xx body is `Null`.
    pub(crate) async fn fetch_json(
        &self,
        action: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, HandlerError> {
        let response = send_checked(action, request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| HandlerError::Http { action, source })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| HandlerError::Upstream {
            action,
            status: format!("invalid JSON in response: {}", e),
        })
    }
}

/// `base` with each of `segments` appended as one escaped path segment.
///
/// Identifiers that are empty or a dot segment are rejected instead of
/// being allowed to change the resource path.
pub(crate) fn endpoint_url(
    action: &'static str,
    base: &str,
    segments: &[&str],
) -> Result<Url, HandlerError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(HandlerError::InvalidArguments(format!(
            "{}: invalid identifier '{}'",
            action, bad
        )));
    }
    let invalid = || HandlerError::Upstream {
        action,
        status: format!("invalid endpoint URL '{}'", base),
    };
    let mut url = Url::parse(base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn send_checked(action: &'static str, request: RequestBuilder) -> Result<Response, HandlerError> {
    let response = request
        .send()
        .await
        .map_err(|source| HandlerError::Http { action, source })?;
    let status = response.status();
    debug!(status = %status, "Google API responded to '{}'", action);
    if status.is_success() {
        Ok(response)
    } else {
        Err(HandlerError::Upstream {
            action,
            status: status.to_string(),
        })
    }
}

/// A catalog tool bound to the workspace client
pub struct WorkspaceHandler {
    name: &'static str,
    client: Arc<WorkspaceClient>,
}

impl WorkspaceHandler {
    pub fn new(name: &'static str, client: Arc<WorkspaceClient>) -> Self {
        Self { name, client }
    }
}

#[async_trait]
impl CapabilityHandler for WorkspaceHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn invoke(&self, request: ToolRequest) -> HandlerResult {
        let client = self.client.as_ref();
        match request {
            ToolRequest::ListEmails(args) => gmail::list_emails(client, args).await,
            ToolRequest::SearchEmails(args) => gmail::search_emails(client, args).await,
            ToolRequest::SendEmail(args) => gmail::send_email(client, args).await,
            ToolRequest::ModifyEmail(args) => gmail::modify_email(client, args).await,
            ToolRequest::ListEvents(args) => calendar::list_events(client, args).await,
            ToolRequest::CreateEvent(args) => calendar::create_event(client, args).await,
            ToolRequest::UpdateEvent(args) => calendar::update_event(client, args).await,
            ToolRequest::DeleteEvent(args) => calendar::delete_event(client, args).await,
            ToolRequest::ListContacts(args) => people::list_contacts(client, args).await,
            ToolRequest::GetUserInfo(args) => people::get_user_info(client, args).await,
            ToolRequest::Unknown { name, .. } => Err(HandlerError::InvalidArguments(format!(
                "no workspace operation named '{}'",
                name
            ))),
        }
    }
}

/// One handler per catalog tool, all sharing `client`
pub fn workspace_handlers(client: Arc<WorkspaceClient>) -> Vec<Arc<dyn CapabilityHandler>> {
    [
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
    ]
    .into_iter()
    .map(|name| Arc::new(WorkspaceHandler::new(name, client.clone())) as Arc<dyn CapabilityHandler>)
    .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn client_for(server: &mockito::ServerGuard) -> WorkspaceClient {
        WorkspaceClient::new(Endpoints::rooted_at(&server.url()), Duration::from_secs(5)).unwrap()
    }

    pub fn text_of(result: HandlerResult) -> String {
        match result.unwrap().into_iter().next() {
            Some(crate::core::models::ToolContent::Text { text }) => text,
            None => panic!("handler returned no content"),
        }
    }
}
