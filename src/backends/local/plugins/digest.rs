// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::plugins::{Actions, Handled, PluginResult, RpcHandleContext, RpcOutcome};
use crate::signer::keccak256;
use crate::traits::Plugin;
use crate::utils::{to_hex_prefixed, value_bytes};

/// Computes `web3_sha3` (keccak256) and `sha256` locally.
#[derive(Debug, Default)]
pub struct DigestHandler;

impl DigestHandler {
    pub const ACTIONS: Actions = Actions::RPC_HANDLE;

    pub fn new() -> Self {
        Self
    }
}

impl Plugin for DigestHandler {
    fn name(&self) -> &'static str {
        "digest"
    }

    fn handle_rpc(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        let hash = match call.method() {
            "web3_sha3" => keccak256(&value_bytes(call.param(0)?, None)?).to_vec(),
            "sha256" => Sha256::digest(value_bytes(call.param(0)?, None)?).to_vec(),
            _ => return Ok(Handled::Declined),
        };
        Ok(Handled::Done(RpcOutcome::Result(json!(to_hex_prefixed(&hash)))))
    }
}
