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

//! Error taxonomy.
//!
//! Protocol faults (`DispatchError`) become JSON-RPC error objects, routing
//! faults (`RoutingError`) become HTTP 400 answers for the one offending
//! delivery, and handler failures (`HandlerError`) are rendered as ordinary
//! tool content with `isError` set.

use crate::core::constants::jsonrpc;
use crate::core::models::SessionId;
use thiserror::Error;

/// Startup and process-level failures
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Catalog and handler binding mismatch
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised while binding handlers to the catalog. Always fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tool '{0}' is declared more than once")]
    DuplicateTool(String),

    #[error("tool '{0}' has no bound handler")]
    UnboundTool(String),

    #[error("tool '{0}' has no request shape")]
    MissingRequestShape(String),

    #[error("handler '{0}' does not match any catalog entry")]
    OrphanHandler(String),

    #[error("tool '{0}' is bound to more than one handler")]
    DuplicateHandler(String),
}

/// Protocol-level fault raised by the dispatch table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    MethodNotFound(String),
}

impl DispatchError {
    /// JSON-RPC error code for this fault
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::MethodNotFound(_) => jsonrpc::ERROR_METHOD_NOT_FOUND,
        }
    }
}

/// A push-channel delivery that could not be routed to an open session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Missing sessionId parameter")]
    MissingSessionId,

    #[error("Malformed sessionId: {0}")]
    MalformedSessionId(String),

    #[error("No transport found for sessionId {0}")]
    UnknownSession(String),

    #[error("Session {0} is closed")]
    SessionClosed(SessionId),
}

impl RoutingError {
    /// HTTP status returned to the offending request
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// A capability handler ran and failed
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to {action}: {status}")]
    Upstream { action: &'static str, status: String },

    #[error("Failed to {action}: {source}")]
    Http {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Handler panicked: {0}")]
    Panicked(String),
}
