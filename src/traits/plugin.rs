// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};

use crate::errors::RequestError;
use crate::plugins::{ErrorLogEvent, Handled, PluginResult, RpcHandleContext, RpcOutcome, SignRequest};

/// A capability provider attached to a [`crate::client::Client`].
///
/// A plugin is only invoked for the actions it declared at registration. Every
/// handler has a default that declines, so implementors override just the
/// actions they declare.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// `INIT`: called once, before the first context on the client is built.
    fn init(&self) -> Result<(), RequestError> {
        Ok(())
    }

    /// `TERM`: release whatever the plugin holds.
    fn term(&self) -> Result<(), RequestError> {
        Ok(())
    }

    /// `SIGN`: return the signature over `request.message`, or decline when the
    /// requested account is not ours.
    fn sign(&self, _request: &SignRequest<'_>) -> PluginResult<Vec<u8>> {
        Ok(Handled::Declined)
    }

    /// `SIGN_ACCOUNT`: the accounts this plugin can sign for.
    fn sign_accounts(&self) -> PluginResult<Vec<Vec<u8>>> {
        Ok(Handled::Declined)
    }

    /// `SIGN_PUBLICKEY`
    fn sign_public_key(&self, _account: Option<&[u8]>) -> PluginResult<Vec<u8>> {
        Ok(Handled::Declined)
    }

    /// `RPC_HANDLE`: answer, forward, wait or decline a single call.
    fn handle_rpc(&self, _call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        Ok(Handled::Declined)
    }

    /// `CONFIG_GET`: add this plugin's settings to the snapshot.
    fn config_get(&self, _out: &mut Map<String, Value>) -> PluginResult<()> {
        Ok(Handled::Declined)
    }

    /// `CONFIG_SET`: accept `key` if it belongs to this plugin.
    fn config_set(&self, _key: &str, _value: &Value) -> PluginResult<()> {
        Ok(Handled::Declined)
    }

    /// `LOG_ERROR`
    fn log_error(&self, _event: &ErrorLogEvent<'_>) -> PluginResult<()> {
        Ok(Handled::Declined)
    }

    /// `PAY_SIGN_REQ`: sign the hash of an outgoing request.
    fn sign_payment(&self, _request_hash: &[u8; 32]) -> PluginResult<Vec<u8>> {
        Ok(Handled::Declined)
    }
}
