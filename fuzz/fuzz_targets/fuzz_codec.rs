// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use bytes::BytesMut;
use gworkspace_mcp::mcp::codec::McpCodec;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Split the input so partial headers and bodies are exercised too.
    let split = data.first().map(|b| *b as usize % (data.len() + 1)).unwrap_or(0);
    let (head, tail) = data.split_at(split);

    let mut codec = McpCodec::new();
    let mut buffer = BytesMut::from(head);
    while let Ok(Some(_)) = codec.decode(&mut buffer) {}
    buffer.extend_from_slice(tail);
    while let Ok(Some(_)) = codec.decode(&mut buffer) {}
    let _ = codec.decode_eof(&mut buffer);
});
