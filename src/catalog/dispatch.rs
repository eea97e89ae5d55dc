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

//! Capability dispatch table.
//!
//! Binds every catalog entry to exactly one `CapabilityHandler`. The binding
//! is checked when the table is built, so a missing or stray handler stops
//! the server at startup instead of surfacing as `MethodNotFound` later.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::catalog::registry::Catalog;
use crate::catalog::request::ToolRequest;
use crate::core::errors::{CatalogError, DispatchError, HandlerError};
use crate::core::models::{HandlerResult, ToolResult};

/// Implementation of one catalog tool
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Catalog name this handler is bound to
    fn name(&self) -> &'static str;

    async fn invoke(&self, request: ToolRequest) -> HandlerResult;
}

pub struct DispatchTable {
    catalog: Catalog,
    handlers: HashMap<&'static str, Arc<dyn CapabilityHandler>>,
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("DispatchTable")
            .field("handlers", &names)
            .finish()
    }
}

impl DispatchTable {
    pub fn build(
        catalog: Catalog,
        handlers: Vec<Arc<dyn CapabilityHandler>>,
    ) -> Result<Self, CatalogError> {
        let mut bound: HashMap<&'static str, Arc<dyn CapabilityHandler>> = HashMap::new();
        for handler in handlers {
            let name = handler.name();
            if catalog.find(name).is_none() {
                return Err(CatalogError::OrphanHandler(name.to_string()));
            }
            if bound.insert(name, handler).is_some() {
                return Err(CatalogError::DuplicateHandler(name.to_string()));
            }
        }

        for tool in catalog.list() {
            if !ToolRequest::recognizes(tool.name) {
                return Err(CatalogError::MissingRequestShape(tool.name.to_string()));
            }
            if !bound.contains_key(tool.name) {
                return Err(CatalogError::UnboundTool(tool.name.to_string()));
            }
        }

        debug!("Dispatch table bound {} tools", bound.len());
        Ok(Self {
            catalog,
            handlers: bound,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Invoke the handler bound to `name`.
    ///
    /// `Err` is reserved for protocol faults. Anything that goes wrong once a
    /// handler has been resolved, including a bad argument shape or a panic
    /// inside the handler, comes back as a `ToolResult` with `is_error` set.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolResult, DispatchError> {
        let handler = self
            .handlers
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::MethodNotFound(name.to_string()))?;

        let request = match ToolRequest::decode(name, arguments) {
            Ok(ToolRequest::Unknown { name, .. }) => return Err(DispatchError::MethodNotFound(name)),
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected arguments for {}: {}", name, e);
                return Ok(ToolResult::failure(e.to_string()));
            }
        };

        let outcome = AssertUnwindSafe(handler.invoke(request)).catch_unwind().await;
        let result = match outcome {
            Ok(Ok(content)) => ToolResult::success(content),
            Ok(Err(e)) => {
                warn!("Tool {} failed: {}", name, e);
                ToolResult::failure(e.to_string())
            }
            Err(panic) => {
                let err = HandlerError::Panicked(panic_message(panic.as_ref()));
                error!("Tool {} panicked: {}", name, err);
                ToolResult::failure(err.to_string())
            }
        };
        Ok(result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
