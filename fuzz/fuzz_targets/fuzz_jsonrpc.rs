// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use gworkspace_mcp::catalog::ToolRequest;
use gworkspace_mcp::core::models::{JsonRpcRequest, JsonRpcResponse};
use gworkspace_mcp::mcp::pipeline::{classify_frame, DownstreamEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<JsonRpcResponse>(data);

    // Every frame is either ignored, answered, or a well-formed request.
    if let Some(DownstreamEvent::Request(request)) = classify_frame(data) {
        let _ = serde_json::to_vec(&request);
        if let Some(params) = request.params {
            if let Some(name) = params.get("name").and_then(|n| n.as_str()) {
                let arguments = params.get("arguments").cloned().unwrap_or_default();
                let _ = ToolRequest::decode(name, arguments);
            }
        }
    }
    let _ = serde_json::from_slice::<JsonRpcRequest>(data);
});
