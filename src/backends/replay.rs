// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A transport that answers from recorded responses instead of the network.
//!
//! The recording maps a method name to what the network should return:
//! ```yaml
//! eth_blockNumber: "0x10"
//! eth_getBalance:
//!   error: { code: -32602, message: "unknown account" }
//! sign_ec_hash: "0x<65 byte signature>"
//! ```
//! RPC methods get a JSON-RPC response wrapping the value (or the `error`
//! object). Signature requests get the decoded bytes of the hex string.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::parse_document;
use crate::errors::TransportError;
use crate::request::{OutgoingRequest, RequestKind};
use crate::traits::Transport;
use crate::utils::decode_hex;

pub struct ReplayTransport {
    responses: HashMap<String, Value>,
}

impl ReplayTransport {
    pub fn new(responses: HashMap<String, Value>) -> Self {
        Self { responses }
    }

    /// Load a recording from a YAML, TOML or JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let responses: HashMap<String, Value> = parse_document(path)
            .with_context(|| format!("loading recorded responses from {}", path.display()))?;
        Ok(Self::new(responses))
    }

    fn reply(&self, request: &OutgoingRequest, recorded: &Value) -> Result<Vec<u8>, TransportError> {
        if request.kind == RequestKind::Sign {
            let text = recorded.as_str().ok_or_else(|| {
                TransportError::new(format!("recorded signature for '{}' is not a string", request.method))
            })?;
            return decode_hex(text).map_err(|e| TransportError::new(e.to_string()));
        }

        let id = serde_json::from_str::<Value>(&request.payload)
            .ok()
            .and_then(|payload| payload.get("id").cloned())
            .unwrap_or(Value::Null);
        let response = match recorded.get("error") {
            Some(error) => json!({"id": id, "jsonrpc": "2.0", "error": error}),
            None => json!({"id": id, "jsonrpc": "2.0", "result": recorded}),
        };
        Ok(response.to_string().into_bytes())
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn fetch(&self, request: &OutgoingRequest) -> Result<Vec<u8>, TransportError> {
        let recorded = self.responses.get(&request.method).ok_or_else(|| {
            TransportError::new(format!("no recorded response for '{}'", request.method))
        })?;
        self.reply(request, recorded)
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
