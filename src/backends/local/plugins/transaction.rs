// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `eth_sendTransaction` and `eth_sign` on top of the signing protocol.
//!
//! Both methods are re-entered on every poll of their context until the
//! signature (and for transactions, the raw-transaction sub-request) is
//! available; the signing protocol and marker dedup keep each step from being
//! issued twice.

use serde_json::{json, Value};

use crate::errors::RequestError;
use crate::plugins::{Actions, Handled, PluginResult, RpcHandleContext, RpcOutcome};
use crate::request::{DedupMode, Resolution};
use crate::signer::{DigestType, PayloadType, SignatureSpec};
use crate::traits::Plugin;
use crate::utils::{to_hex_prefixed, value_bytes};

#[derive(Debug, Default)]
pub struct TransactionHandler;

impl TransactionHandler {
    pub const ACTIONS: Actions = Actions::RPC_HANDLE;

    pub fn new() -> Self {
        Self
    }

    fn send_transaction(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        let tx = call.param(0)?.clone();
        let from = tx
            .get("from")
            .ok_or_else(|| RequestError::invalid_parameter("transaction has no 'from' address"))
            .and_then(|from| value_bytes(from, Some(20)))?;
        let message = serde_json::to_vec(&tx)
            .map_err(|e| RequestError::invalid_parameter(format!("unencodable transaction: {}", e)))?;

        let spec = SignatureSpec::keccak(&message, &from).with_payload(PayloadType::EthTx);
        let signature = match call.req.require_signature(&spec) {
            Resolution::Ready(signature) => signature,
            Resolution::Blocked => return Ok(Handled::Pending),
            Resolution::Failed(err) => return Err(err.context("sign transaction")),
        };

        let raw = [message, signature].concat();
        call.req
            .require_sub_request(
                "eth_sendRawTransaction",
                vec![json!(to_hex_prefixed(&raw))],
                None,
                DedupMode::Marker,
            )
            .map(RpcOutcome::Result)
            .into_handled()
            .map_err(|err| err.context("send raw transaction"))
    }

    fn sign_message(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        let account = value_bytes(call.param(0)?, Some(20))?;
        let message = value_bytes(call.param(1)?, None)?;

        let spec = SignatureSpec::keccak(&message, &account).with_digest(DigestType::Prefix);
        call.req
            .require_signature(&spec)
            .map(|signature| RpcOutcome::Result(Value::String(to_hex_prefixed(&signature))))
            .into_handled()
    }
}

impl Plugin for TransactionHandler {
    fn name(&self) -> &'static str {
        "transaction"
    }

    fn handle_rpc(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        match call.method() {
            "eth_sendTransaction" => self.send_transaction(call),
            "eth_sign" => self.sign_message(call),
            _ => Ok(Handled::Declined),
        }
    }
}
