// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for plugins, keys and transports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::errors::{RequestError, TransportError};
use crate::plugins::{ErrorLogEvent, Handled, PluginResult, RpcHandleContext, RpcOutcome, SignRequest};
use crate::request::OutgoingRequest;
use crate::signer::keccak256;
use crate::traits::{KeyPair, Plugin, Transport};

/// Counts lifecycle calls and optionally owns one config key.
pub struct RecordingPlugin {
    name: &'static str,
    init_calls: AtomicUsize,
    term_calls: AtomicUsize,
    fail_term: bool,
    config_key: Option<String>,
    config_value: Mutex<Option<Value>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingPlugin {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            init_calls: AtomicUsize::new(0),
            term_calls: AtomicUsize::new(0),
            fail_term: false,
            config_key: None,
            config_value: Mutex::new(None),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_term(name: &'static str) -> Self {
        Self {
            fail_term: true,
            ..Self::new(name)
        }
    }

    pub fn with_config_key(mut self, key: &str) -> Self {
        self.config_key = Some(key.to_string());
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn term_calls(&self) -> usize {
        self.term_calls.load(Ordering::SeqCst)
    }

    pub fn logged_errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&self) -> Result<(), RequestError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn term(&self) -> Result<(), RequestError> {
        self.term_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_term {
            return Err(RequestError::remote("term failed"));
        }
        Ok(())
    }

    fn config_set(&self, key: &str, value: &Value) -> PluginResult<()> {
        if self.config_key.as_deref() != Some(key) {
            return Ok(Handled::Declined);
        }
        *self.config_value.lock() = Some(value.clone());
        Ok(Handled::Done(()))
    }

    fn config_get(&self, out: &mut Map<String, Value>) -> PluginResult<()> {
        if let (Some(key), Some(value)) = (&self.config_key, self.config_value.lock().clone()) {
            out.insert(key.clone(), value);
        }
        Ok(Handled::Done(()))
    }

    fn log_error(&self, event: &ErrorLogEvent<'_>) -> PluginResult<()> {
        self.errors.lock().push(event.message.to_string());
        Ok(Handled::Done(()))
    }
}

enum SignBehavior {
    Decline,
    Answer(Vec<u8>),
    Fail,
}

/// A `SIGN` handler with a fixed answer.
pub struct ScriptedSigner {
    name: &'static str,
    behavior: SignBehavior,
    calls: AtomicUsize,
}

impl ScriptedSigner {
    fn with_behavior(name: &'static str, behavior: SignBehavior) -> Self {
        Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn declining(name: &'static str) -> Self {
        Self::with_behavior(name, SignBehavior::Decline)
    }

    pub fn answering(name: &'static str, signature: Vec<u8>) -> Self {
        Self::with_behavior(name, SignBehavior::Answer(signature))
    }

    pub fn failing(name: &'static str) -> Self {
        Self::with_behavior(name, SignBehavior::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Plugin for ScriptedSigner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sign(&self, _request: &SignRequest<'_>) -> PluginResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SignBehavior::Decline => Ok(Handled::Declined),
            SignBehavior::Answer(signature) => Ok(Handled::Done(signature.clone())),
            SignBehavior::Fail => Err(RequestError::invalid_parameter("signer rejected the message")),
        }
    }
}

/// Deterministic stand-in for a secp256k1 key.
#[derive(Debug, Clone)]
pub struct StubKeyPair {
    seed: u8,
}

impl StubKeyPair {
    pub fn new(seed: u8) -> Self {
        Self { seed }
    }
}

impl KeyPair for StubKeyPair {
    fn address(&self) -> [u8; 20] {
        let hash = keccak256(&[self.seed]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }

    fn public_key(&self) -> Vec<u8> {
        [keccak256(&[self.seed, 1]), keccak256(&[self.seed, 2])].concat()
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, RequestError> {
        let r = Sha256::new().chain_update([self.seed]).chain_update(digest).finalize();
        let s = Sha256::digest(r);
        let mut signature = [r.as_slice(), s.as_slice()].concat();
        signature.push(digest[0] & 1);
        Ok(signature)
    }
}

/// Answers `test_echo` with its params.
pub struct EchoHandler;

impl Plugin for EchoHandler {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn handle_rpc(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        if call.method() != "test_echo" {
            return Ok(Handled::Declined);
        }
        Ok(Handled::Done(RpcOutcome::Result(Value::Array(call.params().to_vec()))))
    }
}

/// Claims `test_wait` but never finishes it.
pub struct WaitingHandler;

impl Plugin for WaitingHandler {
    fn name(&self) -> &'static str {
        "waiting"
    }

    fn handle_rpc(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        if call.method() == "test_wait" {
            Ok(Handled::Pending)
        } else {
            Ok(Handled::Declined)
        }
    }
}

#[derive(Clone)]
enum MockReply {
    Result(Value),
    Raw(Vec<u8>),
    Fail(String),
}

/// Transport answering by method name and recording what it was sent.
#[derive(Default)]
pub struct MockTransport {
    replies: HashMap<String, MockReply>,
    delay: Option<Duration>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `method` with a JSON-RPC response carrying `result`.
    pub fn with_result(mut self, method: &str, result: Value) -> Self {
        self.replies.insert(method.to_string(), MockReply::Result(result));
        self
    }

    /// Reply to `method` with these exact bytes.
    pub fn with_raw(mut self, method: &str, bytes: Vec<u8>) -> Self {
        self.replies.insert(method.to_string(), MockReply::Raw(bytes));
        self
    }

    pub fn with_failure(mut self, method: &str, reason: &str) -> Self {
        self.replies.insert(method.to_string(), MockReply::Fail(reason.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.method == method).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &OutgoingRequest) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.replies.get(&request.method).cloned() {
            Some(MockReply::Result(result)) => {
                let id = serde_json::from_str::<Value>(&request.payload)
                    .ok()
                    .and_then(|payload| payload.get("id").cloned())
                    .unwrap_or(Value::Null);
                Ok(json!({"id": id, "jsonrpc": "2.0", "result": result})
                    .to_string()
                    .into_bytes())
            }
            Some(MockReply::Raw(bytes)) => Ok(bytes),
            Some(MockReply::Fail(reason)) => Err(TransportError::new(reason)),
            None => Err(TransportError::new(format!(
                "no mock reply for '{}'",
                request.method
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
