// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{json, Value};

use crate::plugins::{Actions, Handled, PluginResult, RpcHandleContext, RpcOutcome};
use crate::traits::Plugin;
use crate::utils::to_hex_prefixed;

/// Answers `eth_accounts` from the client's `SIGN_ACCOUNT` plugins. With no
/// local accounts the call goes to the node instead.
#[derive(Debug, Default)]
pub struct AccountsHandler;

impl AccountsHandler {
    pub const ACTIONS: Actions = Actions::RPC_HANDLE;

    pub fn new() -> Self {
        Self
    }
}

impl Plugin for AccountsHandler {
    fn name(&self) -> &'static str {
        "accounts"
    }

    fn handle_rpc(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        if call.method() != "eth_accounts" {
            return Ok(Handled::Declined);
        }
        let accounts: Vec<Value> = call
            .req
            .client()
            .accounts()
            .iter()
            .map(|account| json!(to_hex_prefixed(account)))
            .collect();
        if accounts.is_empty() {
            return Ok(Handled::Done(RpcOutcome::Forward));
        }
        Ok(Handled::Done(RpcOutcome::Result(Value::Array(accounts))))
    }
}
