// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hex helpers for the `0x`-prefixed byte strings used in JSON-RPC payloads.

use serde_json::Value;

use crate::errors::RequestError;

pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", to_hex(bytes))
}

/// Decode a hex string, with or without `0x`. Odd-length input gets a leading zero.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, RequestError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits))
    } else {
        hex::decode(digits)
    };
    decoded.map_err(|e| RequestError::invalid_parameter(format!("invalid hex '{}': {}", text, e)))
}

/// Decode a JSON string value as hex, optionally checking its length.
pub fn value_bytes(value: &Value, expected_len: Option<usize>) -> Result<Vec<u8>, RequestError> {
    let text = value
        .as_str()
        .ok_or_else(|| RequestError::invalid_parameter(format!("expected a hex string, got {}", value)))?;
    let bytes = decode_hex(text)?;
    match expected_len {
        Some(len) if bytes.len() != len => Err(RequestError::invalid_parameter(format!(
            "expected {} bytes, got {}",
            len,
            bytes.len()
        ))),
        _ => Ok(bytes),
    }
}
