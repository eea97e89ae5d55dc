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

//! gworkspace-mcp: Google Workspace tools over MCP.
//!
//! Serves a fixed catalog of Gmail, Calendar and People tools to MCP
//! clients over a stdio pipe, an HTTP server-sent events channel with many
//! concurrent sessions, or both at once, through one protocol engine.

pub mod catalog;
pub mod config;
pub mod core;
pub mod handlers;
pub mod mcp;
