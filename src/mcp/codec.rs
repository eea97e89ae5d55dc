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

//! MCP Transport Codec.
//!
//! Handles the low-level framing of JSON-RPC messages on the pipe transport.
//! Supports both standard JSON-RPC (newline delimited) and LSP-style
//! Content-Length headers. The framing is sniffed per message from the
//! inbound stream and mirrored on outbound responses; clones of a codec
//! share what they observed, so a reader and writer pair stay in step.

use crate::core::constants::limits;
use crate::core::models::JsonRpcResponse;
use anyhow::{anyhow, Context, Result};
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

const HEADER_PREFIX: &[u8] = b"content-length";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Lines,
    Headers,
}

impl Framing {
    fn from_u8(v: u8) -> Self {
        if v == 1 {
            Framing::Headers
        } else {
            Framing::Lines
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Framing::Lines => 0,
            Framing::Headers => 1,
        }
    }
}

// State machine for LSP-style headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Head,
    Body(usize),
}

#[derive(Debug, Clone)]
pub struct McpCodec {
    state: DecodeState,
    framing: Arc<AtomicU8>,
}

impl McpCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DecodeState::Head,
            framing: Arc::new(AtomicU8::new(Framing::Lines.as_u8())),
        }
    }

    /// Framing of the most recently decoded message
    pub fn framing(&self) -> Framing {
        Framing::from_u8(self.framing.load(Ordering::Acquire))
    }

    fn observe(&self, framing: Framing) {
        self.framing.store(framing.as_u8(), Ordering::Release);
    }

    fn decode_headers(&mut self, src: &mut BytesMut) -> Result<bool> {
        let mut i = 0;
        let mut found_header = false;

        // Scan for \r\n\r\n or \n\n
        while i < src.len() {
            if src[i] == b'\n' {
                if i >= 1 && src[i - 1] == b'\n' {
                    found_header = true;
                    i += 1;
                    break;
                }
                if i >= 3 && src[i - 1] == b'\r' && src[i - 2] == b'\n' && src[i - 3] == b'\r' {
                    found_header = true;
                    i += 1;
                    break;
                }
            }
            i += 1;
        }

        if !found_header {
            if src.len() > limits::MAX_HEADER_BYTES {
                return Err(anyhow!("Header too large"));
            }
            return Ok(false);
        }

        let header_bytes = src.split_to(i);
        let header_str = std::str::from_utf8(&header_bytes).context("Invalid UTF-8 in headers")?;

        let mut len = 0;
        for line in header_str.lines() {
            let lower = line.to_lowercase();
            if lower.starts_with("content-length:") {
                if let Some(val_str) = line.split(':').nth(1) {
                    len = val_str
                        .trim()
                        .parse::<usize>()
                        .context("Invalid content-length value")?;
                    debug!("Found Content-Length: {}", len);
                }
            }
        }

        if len == 0 {
            return Err(anyhow!("Missing or invalid Content-Length header"));
        }
        if len as u64 > limits::MAX_MESSAGE_SIZE_BYTES {
            return Err(anyhow!("Message length {} exceeds max limit", len));
        }

        self.observe(Framing::Headers);
        self.state = DecodeState::Body(len);
        Ok(true)
    }
}

impl Default for McpCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn skip_leading_whitespace(src: &mut BytesMut) {
    let skip = src.iter().take_while(|b| b.is_ascii_whitespace()).count();
    if skip > 0 {
        let _ = src.split_to(skip);
    }
}

/// Whether the buffer starts, or could still start, with a Content-Length header
fn header_prefix(src: &[u8]) -> Option<bool> {
    let n = src.len().min(HEADER_PREFIX.len());
    if !src[..n].eq_ignore_ascii_case(&HEADER_PREFIX[..n]) {
        return Some(false);
    }
    if n < HEADER_PREFIX.len() {
        None
    } else {
        Some(true)
    }
}

fn trim_line(mut line: BytesMut) -> Bytes {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}

impl Decoder for McpCodec {
    /// One raw JSON document; parsing is left to the caller so a bad payload
    /// is answered rather than ending the stream.
    type Item = Bytes;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        trace!("Decoder attempting to read from {} bytes buffer", src.len());
        loop {
            match self.state {
                DecodeState::Head => {
                    skip_leading_whitespace(src);
                    if src.is_empty() {
                        return Ok(None);
                    }
                    match header_prefix(src) {
                        None => return Ok(None),
                        Some(true) => {
                            if !self.decode_headers(src)? {
                                return Ok(None);
                            }
                        }
                        Some(false) => {
                            let Some(pos) = src.iter().position(|b| *b == b'\n') else {
                                if src.len() as u64 > limits::MAX_MESSAGE_SIZE_BYTES {
                                    return Err(anyhow!("Message exceeded size limit"));
                                }
                                return Ok(None);
                            };
                            self.observe(Framing::Lines);
                            return Ok(Some(trim_line(src.split_to(pos + 1))));
                        }
                    }
                }
                DecodeState::Body(len) => {
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }
                    let body = src.split_to(len);
                    self.state = DecodeState::Head;
                    return Ok(Some(body.freeze()));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.iter().all(u8::is_ascii_whitespace) {
            src.clear();
            return Ok(None);
        }
        if self.state == DecodeState::Head && header_prefix(src) == Some(false) {
            // Final line without a trailing newline
            let rest = src.split_to(src.len());
            self.observe(Framing::Lines);
            return Ok(Some(trim_line(rest)));
        }
        Err(anyhow!("Truncated message at end of stream"))
    }
}

impl<'a> Encoder<&'a JsonRpcResponse> for McpCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: &'a JsonRpcResponse, dst: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(item)?;
        match self.framing() {
            Framing::Headers => {
                let header = format!("Content-Length: {}\r\n\r\n", body.len());
                dst.extend_from_slice(header.as_bytes());
                dst.extend_from_slice(&body);
            }
            Framing::Lines => {
                dst.extend_from_slice(&body);
                dst.extend_from_slice(b"\n");
            }
        }
        Ok(())
    }
}
