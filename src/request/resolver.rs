// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sub-request resolution.
//!
//! A handler that needs data from another call asks its context to *require*
//! it. The first request spawns a child context; every later poll with the
//! same request finds that child again instead of spawning a duplicate, and
//! harvests its result once it is ready.

use serde_json::{json, Value};

use crate::errors::{ErrorKind, RequestError};
use crate::observability::messages::resolver::{SubRequestMatched, SubRequestSpawned};
use crate::observability::messages::StructuredLog;
use crate::plugins::Handled;
use crate::request::cache::CacheProps;
use crate::request::context::RequestContext;
use crate::request::state::{ContextState, RequestKind};

const PROVIDER_FAILURE: &str = "error executing provider call";

/// Methods whose sub-requests are matched by their source-request marker
/// first. Covers the raw send as well as `eth_sendTransaction`, so a raw
/// transaction is never broadcast twice.
const MARKER_METHODS: &[&str] = &["eth_sendTransaction", "eth_sendRawTransaction"];

/// How an existing child is recognized as "the same" sub-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Same method and equal params.
    Structural,
    /// The child carries a `SRC_REQ` cache entry equal to the canonical request
    /// text, or failing that, is structurally equal.
    Marker,
}

impl DedupMode {
    pub fn for_method(method: &str) -> Self {
        if MARKER_METHODS.contains(&method) {
            DedupMode::Marker
        } else {
            DedupMode::Structural
        }
    }

    fn label(self) -> &'static str {
        match self {
            DedupMode::Structural => "structural",
            DedupMode::Marker => "marker",
        }
    }
}

/// Outcome of asking for a sub-request's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The child exists but has not finished; poll again later.
    Blocked,
    Ready(T),
    Failed(RequestError),
}

impl<T> Resolution<T> {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Resolution::Blocked)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Blocked => Resolution::Blocked,
            Resolution::Ready(value) => Resolution::Ready(f(value)),
            Resolution::Failed(err) => Resolution::Failed(err),
        }
    }

    /// `Ready` becomes `Ok(Done)`, `Blocked` becomes `Ok(Pending)`.
    pub fn into_handled(self) -> Result<Handled<T>, RequestError> {
        match self {
            Resolution::Blocked => Ok(Handled::Pending),
            Resolution::Ready(value) => Ok(Handled::Done(value)),
            Resolution::Failed(err) => Err(err),
        }
    }
}

/// A call a context depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct SubRequest {
    pub method: String,
    pub params: Vec<Value>,
    pub meta: Option<Value>,
}

impl SubRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn to_document(&self) -> Value {
        let mut document = json!({
            "method": self.method,
            "params": self.params,
        });
        if let (Some(meta), Value::Object(fields)) = (&self.meta, &mut document) {
            fields.insert("in3".into(), meta.clone());
        }
        document
    }

    /// Deterministic text of the request, used as the dedup marker.
    pub fn canonical(&self) -> String {
        self.to_document().to_string()
    }

    fn matches_params(&self, call: &Value) -> bool {
        call.get("params").and_then(Value::as_array) == Some(&self.params)
    }

    /// Same method and params as the first call of `child`.
    fn matches_child(&self, child: &RequestContext) -> bool {
        child.is_method(&self.method)
            && child
                .calls()
                .first()
                .is_some_and(|call| self.matches_params(call))
    }
}

impl RequestContext {
    /// Require the result of `method(params)`.
    ///
    /// Repeated polls with the same request reuse one child. The child's
    /// chain id and other inheritable cache entries come from this context.
    pub fn require_sub_request(
        &mut self,
        method: &str,
        params: Vec<Value>,
        meta: Option<Value>,
        dedup: DedupMode,
    ) -> Resolution<Value> {
        let mut request = SubRequest::new(method, params);
        if let Some(meta) = meta {
            request = request.with_meta(meta);
        }
        let position = match self.find_required(&request, dedup) {
            Some(position) => position,
            None => match self.spawn_required(&request, dedup, RequestKind::Rpc) {
                Ok(position) => position,
                Err(err) => return Resolution::Failed(err),
            },
        };
        self.harvest_result(position)
    }

    /// [`require_sub_request`](Self::require_sub_request) with the dedup mode
    /// picked from the method name.
    pub fn send_sub_request(
        &mut self,
        method: &str,
        params: Vec<Value>,
        meta: Option<Value>,
    ) -> Resolution<Value> {
        self.require_sub_request(method, params, meta, DedupMode::for_method(method))
    }

    pub fn required(&self) -> &[RequestContext] {
        &self.required
    }

    pub fn required_len(&self) -> usize {
        self.required.len()
    }

    /// Remove a finished child; the caller owns it from here on.
    pub fn detach_required(&mut self, position: usize) -> Option<RequestContext> {
        (position < self.required.len()).then(|| self.required.remove(position))
    }

    /// Position of an existing child for `request`, newest first.
    pub(crate) fn find_required(&self, request: &SubRequest, dedup: DedupMode) -> Option<usize> {
        let canonical = request.canonical();
        let mut children = self.required.iter().enumerate().rev();
        let found = match dedup {
            DedupMode::Marker => children
                .clone()
                .find(|(_, child)| {
                    child
                        .cache()
                        .contains_value(CacheProps::SRC_REQ, canonical.as_bytes())
                })
                .or_else(|| children.find(|(_, child)| request.matches_child(child))),
            DedupMode::Structural => children.find(|(_, child)| request.matches_child(child)),
        };
        let (position, child) = found?;
        SubRequestMatched {
            parent_id: self.id(),
            child_id: child.id(),
            method: &request.method,
            state: &child.state().to_string(),
        }
        .log();
        Some(position)
    }

    /// Create, attach and poll a child for `request`. Returns its position.
    pub(crate) fn spawn_required(
        &mut self,
        request: &SubRequest,
        dedup: DedupMode,
        kind: RequestKind,
    ) -> Result<usize, RequestError> {
        let client = self.client().clone();
        let mut child = RequestContext::from_document(&client, request.to_document(), kind)
            .map_err(|e| e.context("Invalid request!"))?;

        let inherited_entries = self.cache.inherit_into(&mut child.cache);
        if dedup == DedupMode::Marker {
            child.cache.add(
                Vec::new(),
                request.canonical().into_bytes(),
                CacheProps::SRC_REQ,
            );
        }
        SubRequestSpawned {
            parent_id: self.id(),
            child_id: child.id(),
            method: &request.method,
            dedup: dedup.label(),
            inherited_entries,
        }
        .log();

        child.advance();
        self.required.push(child);
        Ok(self.required.len() - 1)
    }

    fn harvest_result(&self, position: usize) -> Resolution<Value> {
        let child = &self.required[position];
        match child.state() {
            ContextState::WaitingToSend | ContextState::WaitingForResponse => Resolution::Blocked,
            ContextState::Error => Resolution::Failed(child.error().unwrap_or_else(|| {
                RequestError::new(ErrorKind::RemoteError, PROVIDER_FAILURE)
            })),
            ContextState::Success => match child.result(0) {
                Some(result) => Resolution::Ready(result.clone()),
                None => Resolution::Failed(
                    child
                        .check_response_error(0)
                        .err()
                        .unwrap_or_else(|| RequestError::remote(PROVIDER_FAILURE)),
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_mode_for_method() {
        assert_eq!(DedupMode::for_method("eth_sendTransaction"), DedupMode::Marker);
        assert_eq!(DedupMode::for_method("eth_sendRawTransaction"), DedupMode::Marker);
        assert_eq!(DedupMode::for_method("eth_getBalance"), DedupMode::Structural);
    }

    #[test]
    fn test_canonical_includes_meta() {
        let plain = SubRequest::new("eth_call", vec![json!({"to": "0x01"}), json!("latest")]);
        let with_meta = plain.clone().with_meta(json!({"chainId": 5}));
        assert_ne!(plain.canonical(), with_meta.canonical());
        assert_eq!(plain.canonical(), plain.clone().canonical());
        assert_eq!(
            plain.to_document(),
            json!({"method": "eth_call", "params": [{"to": "0x01"}, "latest"]})
        );
    }

    #[test]
    fn test_matches_params_ignores_other_members() {
        let request = SubRequest::new("eth_getBalance", vec![json!("0xab"), json!("latest")]);
        assert!(request.matches_params(&json!({"method": "eth_getBalance", "params": ["0xab", "latest"], "id": 4})));
        assert!(!request.matches_params(&json!({"method": "eth_getBalance", "params": ["0xab"]})));
        assert!(!request.matches_params(&json!({"method": "eth_call"})));
    }

    #[test]
    fn test_resolution_into_handled() {
        assert_eq!(Resolution::<u8>::Blocked.into_handled(), Ok(Handled::Pending));
        assert_eq!(Resolution::Ready(3).into_handled(), Ok(Handled::Done(3)));
        assert!(Resolution::<u8>::Failed(RequestError::remote("x")).into_handled().is_err());
        assert_eq!(Resolution::Ready(2).map(|v| v * 2), Resolution::Ready(4));
    }
}
