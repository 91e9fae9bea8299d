// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Obtaining signatures from inside a request.
//!
//! A signature is looked up in the context cache first, then requested from
//! the local `SIGN` plugins, and finally delegated to a remote signer through
//! a `sign_ec_*` sub-request. Each step is safe to repeat on every poll.

use serde_json::{json, Value};

use crate::errors::{ErrorKind, RequestError};
use crate::observability::messages::signer::{SignatureDelegated, SignatureRequested};
use crate::observability::messages::StructuredLog;
use crate::plugins::{Actions, Handled, SignRequest};
use crate::request::{
    CacheProps, ContextState, DedupMode, RequestContext, RequestKind, Resolution, SlotState,
    SubRequest,
};
use crate::signer::{CurveType, DigestType, PayloadType};
use crate::utils::to_hex_prefixed;

/// Shortest byte string accepted as a signature from a remote signer.
const MIN_SIGNATURE_LEN: usize = 65;

/// What to sign and with which key.
#[derive(Debug, Clone)]
pub struct SignatureSpec<'a> {
    pub digest: DigestType,
    pub curve: CurveType,
    pub payload: PayloadType,
    pub message: &'a [u8],
    pub account: &'a [u8],
    pub meta: Option<&'a Value>,
}

impl<'a> SignatureSpec<'a> {
    /// secp256k1 over keccak256(message), the common Ethereum case.
    pub fn keccak(message: &'a [u8], account: &'a [u8]) -> Self {
        Self {
            digest: DigestType::Hash,
            curve: CurveType::Secp256k1,
            payload: PayloadType::Any,
            message,
            account,
            meta: None,
        }
    }

    pub fn with_digest(mut self, digest: DigestType) -> Self {
        self.digest = digest;
        self
    }

    pub fn with_payload(mut self, payload: PayloadType) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_meta(mut self, meta: &'a Value) -> Self {
        self.meta = Some(meta);
        self
    }

    fn cache_key(&self) -> Vec<u8> {
        [self.message, self.account].concat()
    }

    fn remote_request(&self) -> SubRequest {
        let mut params = vec![
            json!(to_hex_prefixed(self.message)),
            json!(to_hex_prefixed(self.account)),
            json!(self.payload as u8),
            json!(self.curve as u8),
        ];
        if let Some(meta) = self.meta {
            params.push(meta.clone());
        }
        SubRequest::new(self.digest.method_name(), params)
    }
}

impl RequestContext {
    /// Obtain a signature for `spec`, caching it on this context.
    pub fn require_signature(&mut self, spec: &SignatureSpec<'_>) -> Resolution<Vec<u8>> {
        let cache_key = spec.cache_key();
        if let Some(signature) = self.cache().get(&cache_key) {
            return Resolution::Ready(signature.to_vec());
        }

        SignatureRequested {
            request_id: self.id(),
            digest: spec.digest.method_name(),
            account: &to_hex_prefixed(spec.account),
        }
        .log();

        let client = self.client().clone();
        if client.has_capability(Actions::SIGN) {
            let request = SignRequest {
                request_id: self.id(),
                account: spec.account,
                message: spec.message,
                digest: spec.digest,
                payload: spec.payload,
                curve: spec.curve,
                meta: spec.meta,
            };
            let local = client
                .plugins()
                .first_success_or_none(Actions::SIGN, |plugin| match plugin.sign(&request)? {
                    Handled::Done(signature) if signature.is_empty() => Ok(Handled::Declined),
                    other => Ok(other),
                });
            match local {
                Ok(Handled::Done(signature)) => {
                    self.cache_mut()
                        .add(cache_key, signature.clone(), CacheProps::empty());
                    return Resolution::Ready(signature);
                }
                Ok(Handled::Pending) => return Resolution::Blocked,
                Ok(Handled::Declined) => {}
                Err(err) => return Resolution::Failed(err),
            }
        }

        self.delegate_signature(spec, cache_key)
    }

    fn delegate_signature(&mut self, spec: &SignatureSpec<'_>, cache_key: Vec<u8>) -> Resolution<Vec<u8>> {
        let request = spec.remote_request();
        let position = match self.find_required(&request, DedupMode::Marker) {
            Some(position) => position,
            None => {
                SignatureDelegated {
                    request_id: self.id(),
                    method: &request.method,
                }
                .log();
                match self.spawn_required(&request, DedupMode::Marker, RequestKind::Sign) {
                    Ok(position) => position,
                    Err(err) => return Resolution::Failed(err),
                }
            }
        };

        let child = &self.required()[position];
        match child.state() {
            ContextState::WaitingToSend | ContextState::WaitingForResponse => Resolution::Blocked,
            ContextState::Error => Resolution::Failed(child.error().unwrap_or_else(|| {
                RequestError::remote("Could not handle signing")
            })),
            ContextState::Success => {
                let (state, data) = match child.slots().first() {
                    Some(slot) => (slot.state, slot.data.clone()),
                    None => (SlotState::Unresolved, Vec::new()),
                };
                match state {
                    SlotState::Ok if data.len() >= MIN_SIGNATURE_LEN => {
                        self.cache_mut()
                            .add(cache_key, data.clone(), CacheProps::empty());
                        self.detach_required(position);
                        Resolution::Ready(data)
                    }
                    SlotState::Failed(kind) => Resolution::Failed(RequestError::new(
                        kind,
                        String::from_utf8_lossy(&data).into_owned(),
                    )),
                    _ => Resolution::Failed(RequestError::new(
                        ErrorKind::InvalidParameter,
                        "no data to sign",
                    )),
                }
            }
        }
    }
}
