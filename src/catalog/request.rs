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

//! Typed tool requests.
//!
//! The untyped `arguments` object of a `tools/call` is decoded once, at the
//! dispatch boundary, into one `ToolRequest` variant per tool. Names outside
//! the closed set land in `ToolRequest::Unknown`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::constants::tools;
use crate::core::errors::HandlerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenArgs {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEmailsArgs {
    pub access_token: String,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEmailsArgs {
    pub access_token: String,
    pub query: String,
    #[serde(default)]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailArgs {
    pub access_token: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyEmailArgs {
    pub access_token: String,
    pub id: String,
    #[serde(default)]
    pub add_labels: Option<Vec<String>>,
    #[serde(default)]
    pub remove_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsArgs {
    pub access_token: String,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub days_back: Option<i64>,
    #[serde(default)]
    pub days_forward: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventArgs {
    pub access_token: String,
    pub summary: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default)]
    pub include_google_meet_details: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventArgs {
    pub access_token: String,
    pub event_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default)]
    pub include_google_meet_details: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventArgs {
    pub access_token: String,
    pub event_id: String,
}

/// One request shape per catalog tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    ListEmails(ListEmailsArgs),
    SearchEmails(SearchEmailsArgs),
    SendEmail(SendEmailArgs),
    ModifyEmail(ModifyEmailArgs),
    ListEvents(ListEventsArgs),
    CreateEvent(CreateEventArgs),
    UpdateEvent(UpdateEventArgs),
    DeleteEvent(DeleteEventArgs),
    ListContacts(TokenArgs),
    GetUserInfo(TokenArgs),
    Unknown { name: String, arguments: Value },
}

fn parse<T: DeserializeOwned>(name: &str, arguments: Value) -> Result<T, HandlerError> {
    // A call with no arguments at all decodes like an empty object.
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| HandlerError::InvalidArguments(format!("{}: {}", name, e)))
}

impl ToolRequest {
    /// Decode `arguments` into the shape registered for `name`.
    ///
    /// Unrecognised names never fail; they become `Unknown`.
    pub fn decode(name: &str, arguments: Value) -> Result<Self, HandlerError> {
        let request = match name {
            tools::LIST_EMAILS => Self::ListEmails(parse(name, arguments)?),
            tools::SEARCH_EMAILS => Self::SearchEmails(parse(name, arguments)?),
            tools::SEND_EMAIL => Self::SendEmail(parse(name, arguments)?),
            tools::MODIFY_EMAIL => Self::ModifyEmail(parse(name, arguments)?),
            tools::LIST_EVENTS => Self::ListEvents(parse(name, arguments)?),
            tools::CREATE_EVENT => Self::CreateEvent(parse(name, arguments)?),
            tools::UPDATE_EVENT => Self::UpdateEvent(parse(name, arguments)?),
            tools::DELETE_EVENT => Self::DeleteEvent(parse(name, arguments)?),
            tools::LIST_CONTACTS => Self::ListContacts(parse(name, arguments)?),
            tools::GET_USER_INFO => Self::GetUserInfo(parse(name, arguments)?),
            _ => Self::Unknown {
                name: name.to_string(),
                arguments,
            },
        };
        Ok(request)
    }

    /// Whether `name` has a request shape
    pub fn recognizes(name: &str) -> bool {
        matches!(
            name,
            tools::LIST_EMAILS
                | tools::SEARCH_EMAILS
                | tools::SEND_EMAIL
                | tools::MODIFY_EMAIL
                | tools::LIST_EVENTS
                | tools::CREATE_EVENT
                | tools::UPDATE_EVENT
                | tools::DELETE_EVENT
                | tools::LIST_CONTACTS
                | tools::GET_USER_INFO
        )
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::ListEmails(_) => tools::LIST_EMAILS,
            Self::SearchEmails(_) => tools::SEARCH_EMAILS,
            Self::SendEmail(_) => tools::SEND_EMAIL,
            Self::ModifyEmail(_) => tools::MODIFY_EMAIL,
            Self::ListEvents(_) => tools::LIST_EVENTS,
            Self::CreateEvent(_) => tools::CREATE_EVENT,
            Self::UpdateEvent(_) => tools::UPDATE_EVENT,
            Self::DeleteEvent(_) => tools::DELETE_EVENT,
            Self::ListContacts(_) => tools::LIST_CONTACTS,
            Self::GetUserInfo(_) => tools::GET_USER_INFO,
            Self::Unknown { name, .. } => name,
        }
    }

    /// Bearer token carried by every known request
    pub fn access_token(&self) -> Option<&str> {
        let token = match self {
            Self::ListEmails(a) => &a.access_token,
            Self::SearchEmails(a) => &a.access_token,
            Self::SendEmail(a) => &a.access_token,
            Self::ModifyEmail(a) => &a.access_token,
            Self::ListEvents(a) => &a.access_token,
            Self::CreateEvent(a) => &a.access_token,
            Self::UpdateEvent(a) => &a.access_token,
            Self::DeleteEvent(a) => &a.access_token,
            Self::ListContacts(a) | Self::GetUserInfo(a) => &a.access_token,
            Self::Unknown { .. } => return None,
        };
        Some(token)
    }
}
