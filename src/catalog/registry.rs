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

//! Capability registry.
//!
//! The tool catalog is a static table fixed at compile time. `Catalog::list`
//! returns it in declared order, which is the order clients see on
//! `tools/list`.

use std::collections::HashSet;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::constants::tools;
use crate::core::errors::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    StringArray,
}

impl ParamKind {
    fn schema(self) -> Value {
        match self {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Number => json!({ "type": "number" }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// Immutable description of one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolDescriptor {
    /// JSON schema object advertised as `inputSchema`
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            let mut schema = param.kind.schema();
            if let Value::Object(obj) = &mut schema {
                obj.insert("description".to_string(), json!(param.description));
            }
            properties.insert(param.name.to_string(), schema);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl Serialize for ToolDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolDescriptor", 3)?;
        state.serialize_field("name", self.name)?;
        state.serialize_field("description", self.description)?;
        state.serialize_field("inputSchema", &self.input_schema())?;
        state.end()
    }
}

const ACCESS_TOKEN: ParamSpec =
    ParamSpec::required("accessToken", ParamKind::String, "Google API access token");

const MAX_RESULTS_EMAILS: ParamSpec = ParamSpec::optional(
    "maxResults",
    ParamKind::Number,
    "Maximum number of emails to return (default: 10)",
);

const MEET_DETAILS: ParamSpec = ParamSpec::optional(
    "includeGoogleMeetDetails",
    ParamKind::Boolean,
    "Whether to include Google Meet video conference details",
);

static WORKSPACE_TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: tools::LIST_EMAILS,
        description: "List recent emails from Gmail inbox",
        params: &[
            ACCESS_TOKEN,
            MAX_RESULTS_EMAILS,
            ParamSpec::optional("query", ParamKind::String, "Search query to filter emails"),
        ],
    },
    ToolDescriptor {
        name: tools::SEARCH_EMAILS,
        description: "Search emails with advanced query",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::required(
                "query",
                ParamKind::String,
                "Gmail search query (e.g., \"from:example@gmail.com has:attachment\")",
            ),
            MAX_RESULTS_EMAILS,
        ],
    },
    ToolDescriptor {
        name: tools::SEND_EMAIL,
        description: "Send a new email",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::required("to", ParamKind::String, "Recipient email address"),
            ParamSpec::required("subject", ParamKind::String, "Email subject"),
            ParamSpec::required("body", ParamKind::String, "Email body (can include HTML)"),
            ParamSpec::optional("cc", ParamKind::String, "CC recipients (comma-separated)"),
            ParamSpec::optional("bcc", ParamKind::String, "BCC recipients (comma-separated)"),
        ],
    },
    ToolDescriptor {
        name: tools::MODIFY_EMAIL,
        description: "Modify email labels (archive, trash, mark read/unread)",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::required("id", ParamKind::String, "Email ID"),
            ParamSpec::optional("addLabels", ParamKind::StringArray, "Labels to add"),
            ParamSpec::optional("removeLabels", ParamKind::StringArray, "Labels to remove"),
        ],
    },
    ToolDescriptor {
        name: tools::LIST_EVENTS,
        description: "List upcoming calendar events",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::optional(
                "maxResults",
                ParamKind::Number,
                "Maximum number of events to return (default: 10)",
            ),
            ParamSpec::optional(
                "daysBack",
                ParamKind::Number,
                "Earliest date to include events from (default: 0 for today)",
            ),
            ParamSpec::optional(
                "daysForward",
                ParamKind::Number,
                "Latest date to include events to",
            ),
        ],
    },
    ToolDescriptor {
        name: tools::CREATE_EVENT,
        description: "Create a new calendar event",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::required("summary", ParamKind::String, "Event title"),
            ParamSpec::optional("location", ParamKind::String, "Event location"),
            ParamSpec::optional("description", ParamKind::String, "Event description"),
            ParamSpec::required("start", ParamKind::String, "Start time in ISO format"),
            ParamSpec::required("end", ParamKind::String, "End time in ISO format"),
            ParamSpec::optional(
                "attendees",
                ParamKind::StringArray,
                "List of attendee email addresses",
            ),
            MEET_DETAILS,
        ],
    },
    ToolDescriptor {
        name: tools::UPDATE_EVENT,
        description: "Update an existing calendar event",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::required("eventId", ParamKind::String, "Event ID to update"),
            ParamSpec::optional("summary", ParamKind::String, "New event title"),
            ParamSpec::optional("location", ParamKind::String, "New event location"),
            ParamSpec::optional("description", ParamKind::String, "New event description"),
            ParamSpec::optional("start", ParamKind::String, "New start time in ISO format"),
            ParamSpec::optional("end", ParamKind::String, "New end time in ISO format"),
            ParamSpec::optional(
                "attendees",
                ParamKind::StringArray,
                "New list of attendee email addresses",
            ),
            MEET_DETAILS,
        ],
    },
    ToolDescriptor {
        name: tools::DELETE_EVENT,
        description: "Delete a calendar event",
        params: &[
            ACCESS_TOKEN,
            ParamSpec::required("eventId", ParamKind::String, "Event ID to delete"),
        ],
    },
    ToolDescriptor {
        name: tools::LIST_CONTACTS,
        description: "List contacts from Google Contacts",
        params: &[ACCESS_TOKEN],
    },
    ToolDescriptor {
        name: tools::GET_USER_INFO,
        description: "Get user information",
        params: &[ACCESS_TOKEN],
    },
];

/// Read-only tool catalog
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    tools: &'static [ToolDescriptor],
}

impl Catalog {
    /// Build a catalog over a static table, rejecting duplicate names.
    pub fn new(tools: &'static [ToolDescriptor]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for tool in tools {
            if !seen.insert(tool.name) {
                return Err(CatalogError::DuplicateTool(tool.name.to_string()));
            }
        }
        Ok(Self { tools })
    }

    /// The Google Workspace catalog
    pub fn workspace() -> Self {
        Self {
            tools: WORKSPACE_TOOLS,
        }
    }

    pub fn list(&self) -> &'static [ToolDescriptor] {
        self.tools
    }

    pub fn find(&self, name: &str) -> Option<&'static ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::workspace()
    }
}
