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

//! Server constants - single source of truth for protocol values,
//! endpoint paths and configuration keys.

/// JSON-RPC 2.0 Error Codes
pub mod jsonrpc {
    /// Protocol version string carried by every message
    pub const VERSION: &str = "2.0";
    /// Parse error (standard JSON-RPC)
    pub const ERROR_PARSE: i32 = -32700;
    /// Invalid request (standard JSON-RPC)
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
    /// Method not found (standard JSON-RPC)
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params (standard JSON-RPC)
    pub const ERROR_INVALID_PARAMS: i32 = -32602;
    /// Internal error (standard JSON-RPC)
    pub const ERROR_INTERNAL: i32 = -32603;
}

/// MCP Protocol Methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Server identity reported during `initialize`
pub mod server {
    pub const NAME: &str = "google-workspace-server";
    pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
    pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];
}

/// Tool names exposed by the catalog
pub mod tools {
    pub const LIST_EMAILS: &str = "list_emails";
    pub const SEARCH_EMAILS: &str = "search_emails";
    pub const SEND_EMAIL: &str = "send_email";
    pub const MODIFY_EMAIL: &str = "modify_email";
    pub const LIST_EVENTS: &str = "list_events";
    pub const CREATE_EVENT: &str = "create_event";
    pub const UPDATE_EVENT: &str = "update_event";
    pub const DELETE_EVENT: &str = "delete_event";
    pub const LIST_CONTACTS: &str = "list_contacts";
    pub const GET_USER_INFO: &str = "get_user_info";
}

/// SSE transport routes and event names
pub mod http {
    pub const SSE_PATH: &str = "/sse";
    pub const MESSAGES_PATH: &str = "/messages";
    pub const HEALTH_PATH: &str = "/health";
    /// Query parameter carrying the session id on `POST /messages`
    pub const SESSION_ID_QUERY: &str = "sessionId";
    pub const ENDPOINT_EVENT: &str = "endpoint";
    pub const MESSAGE_EVENT: &str = "message";
}

/// Google API endpoints
pub mod google {
    pub const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
    pub const CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
    pub const PEOPLE_BASE_URL: &str = "https://people.googleapis.com/v1";
    pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
    /// Page size used when the caller does not pass `maxResults`
    pub const DEFAULT_MAX_RESULTS: u32 = 10;
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_TRANSPORT: &str = "GWS_MCP_TRANSPORT";
    pub const ENV_BIND_ADDRESS: &str = "GWS_MCP_BIND_ADDRESS";
    pub const ENV_PORT: &str = "PORT";
    pub const ENV_SESSION_BUFFER: &str = "GWS_MCP_SESSION_BUFFER";
    pub const ENV_BODY_SIZE_LIMIT: &str = "BODY_SIZE_LIMIT_BYTES";
    pub const ENV_HTTP_TIMEOUT_SECS: &str = "GWS_MCP_HTTP_TIMEOUT_SECS";
    pub const ENV_GMAIL_BASE_URL: &str = "GWS_MCP_GMAIL_BASE_URL";
    pub const ENV_CALENDAR_BASE_URL: &str = "GWS_MCP_CALENDAR_BASE_URL";
    pub const ENV_PEOPLE_BASE_URL: &str = "GWS_MCP_PEOPLE_BASE_URL";
    pub const ENV_USERINFO_URL: &str = "GWS_MCP_USERINFO_URL";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Transport Limits (DoS Protection)
pub mod limits {
    /// Maximum allowed JSON-RPC message size (10 MB)
    pub const MAX_MESSAGE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    /// Maximum size of a Content-Length header block
    pub const MAX_HEADER_BYTES: usize = 4096;
    /// Default per-session queue capacity
    pub const DEFAULT_SESSION_BUFFER: usize = 32;
}
