// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plugin actions and the descriptors handed to handlers.

use serde_json::Value;

use crate::errors::{ErrorKind, RequestError};
use crate::request::RequestContext;
use crate::signer::{CurveType, DigestType, PayloadType};

bitflags::bitflags! {
    /// The capabilities a plugin declares.
    ///
    /// A client keeps the union of all registered plugins' actions so that
    /// "does anyone handle this" is a single bit test.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Actions: u64 {
        /// Delivered once, lazily, when the first context is created.
        const INIT = 1 << 0;
        /// Delivered once to every plugin at client teardown.
        const TERM = 1 << 1;
        /// Sign a message with a local key.
        const SIGN = 1 << 2;
        /// List the accounts this plugin can sign for.
        const SIGN_ACCOUNT = 1 << 3;
        /// Return the public key of an account.
        const SIGN_PUBLICKEY = 1 << 4;
        /// Answer an RPC call locally.
        const RPC_HANDLE = 1 << 5;
        /// Contribute to the client configuration snapshot.
        const CONFIG_GET = 1 << 6;
        /// Accept a configuration key.
        const CONFIG_SET = 1 << 7;
        /// Observe errors recorded on contexts.
        const LOG_ERROR = 1 << 8;
        /// Sign the hash of an outgoing request for a payment provider.
        const PAY_SIGN_REQ = 1 << 9;
    }
}

impl Actions {
    /// Names of the set flags, for logs.
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        if names.is_empty() {
            "no actions".to_string()
        } else {
            names.join("|")
        }
    }
}

/// What a handler did with an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled<T> {
    /// The handler produced its output.
    Done(T),
    /// Not this handler's business; dispatch moves on.
    Declined,
    /// The handler accepted but needs more polls (e.g. waiting on a sub-request).
    Pending,
}

/// Result of invoking a single handler. `Err` is a real failure and stops dispatch.
pub type PluginResult<T> = Result<Handled<T>, RequestError>;

/// What an `RPC_HANDLE` handler wants done with a call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// Answer the call with this `result` value.
    Result(Value),
    /// Send the call to the network as is.
    Forward,
}

/// Descriptor for the `SIGN` action.
#[derive(Debug, Clone)]
pub struct SignRequest<'a> {
    pub request_id: u64,
    /// Account to sign with; handlers owning a different account decline.
    pub account: &'a [u8],
    pub message: &'a [u8],
    pub digest: DigestType,
    pub payload: PayloadType,
    pub curve: CurveType,
    pub meta: Option<&'a Value>,
}

/// Descriptor for the `LOG_ERROR` action.
#[derive(Debug, Clone)]
pub struct ErrorLogEvent<'a> {
    pub request_id: u64,
    pub kind: ErrorKind,
    pub message: &'a str,
}

/// Everything an `RPC_HANDLE` handler sees: the owning context (so it can
/// require sub-requests or signatures), the call index and the call itself.
pub struct RpcHandleContext<'a> {
    pub req: &'a mut RequestContext,
    pub index: usize,
    pub call: &'a Value,
}

impl RpcHandleContext<'_> {
    pub fn method(&self) -> &str {
        self.call.get("method").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn params(&self) -> &[Value] {
        self.call
            .get("params")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Parameter `index`, or an `InvalidParameter` error naming it.
    pub fn param(&self, index: usize) -> Result<&Value, RequestError> {
        self.params().get(index).ok_or_else(|| {
            RequestError::invalid_parameter(format!(
                "missing parameter {} for '{}'",
                index,
                self.method()
            ))
        })
    }
}
