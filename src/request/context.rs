// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::client::{parse_u64, Client};
use crate::errors::{chain_messages, ErrorKind, RequestError};
use crate::observability::messages::request::{
    CallFailed, ContextCompleted, ContextCreated, IntermediateError, InvalidRequest,
};
use crate::observability::messages::StructuredLog;
use crate::plugins::{Actions, ErrorLogEvent, Handled, RpcHandleContext, RpcOutcome};
use crate::request::cache::Cache;
use crate::request::state::{
    CallStatus, ContextState, ExecState, OutgoingRequest, RequestKind, ResponseSlot,
    ResponseStatus, SlotState,
};
use crate::utils::to_hex_prefixed;

const PARSE_FAILURE: &str = "Error parsing the JSON-request!";
const INVALID_STRUCTURE: &str = "The Request is not a valid structure!";

/// The unit of work for one JSON-RPC request or batch.
///
/// A context is polled with [`advance`](Self::advance) until it reports
/// success or error. Between polls the caller ships
/// [`take_outgoing`](Self::take_outgoing) payloads and feeds the answers back
/// through [`add_response_at`](Self::add_response_at). Sub-requests a context
/// depends on are owned children in its `required` list and are dropped with
/// it.
pub struct RequestContext {
    client: Arc<Client>,
    id: u64,
    kind: RequestKind,
    document: Value,
    calls: Vec<Value>,
    error: Option<String>,
    error_kind: Option<ErrorKind>,
    slots: Vec<ResponseSlot>,
    responses: Option<Vec<Value>>,
    pub(crate) cache: Cache,
    pub(crate) required: Vec<RequestContext>,
}

impl RequestContext {
    /// Create a context from request text.
    ///
    /// Only the pending-context bound is reported as `Err`. Malformed input
    /// still yields a context, already in its error state, so the caller can
    /// return a proper error response.
    pub fn new(client: &Arc<Client>, raw: &str) -> Result<Self, RequestError> {
        client.reserve_pending()?;
        let mut ctx = Self::bare(client, RequestKind::Rpc);
        match serde_json::from_str::<Value>(raw) {
            Ok(document) => ctx.load(document),
            Err(e) => {
                let detail = e.to_string();
                InvalidRequest {
                    reason: &detail,
                    input: raw,
                }
                .log();
                ctx.set_error(
                    ErrorKind::ParseError,
                    &chain_messages(PARSE_FAILURE, Some(&detail)),
                );
            }
        }
        ctx.finish_setup();
        Ok(ctx)
    }

    /// Create a context from an already parsed document.
    pub fn from_document(
        client: &Arc<Client>,
        document: Value,
        kind: RequestKind,
    ) -> Result<Self, RequestError> {
        client.reserve_pending()?;
        let mut ctx = Self::bare(client, kind);
        ctx.load(document);
        ctx.finish_setup();
        Ok(ctx)
    }

    fn bare(client: &Arc<Client>, kind: RequestKind) -> Self {
        Self {
            client: Arc::clone(client),
            id: 0,
            kind,
            document: Value::Null,
            calls: Vec::new(),
            error: None,
            error_kind: None,
            slots: Vec::new(),
            responses: None,
            cache: Cache::new(),
            required: Vec::new(),
        }
    }

    fn load(&mut self, document: Value) {
        let calls = match &document {
            Value::Object(_) => Some(vec![document.clone()]),
            Value::Array(items) if !items.is_empty() => Some(items.clone()),
            _ => None,
        };
        let Some(calls) = calls else {
            let input = document.to_string();
            InvalidRequest {
                reason: INVALID_STRUCTURE,
                input: &input,
            }
            .log();
            self.document = document;
            self.set_error(ErrorKind::ParseError, INVALID_STRUCTURE);
            return;
        };

        self.id = match document.get("id").and_then(Value::as_u64) {
            Some(id) => id,
            None => self.client.next_ids(calls.len()),
        };
        let chain_id = calls[0]
            .get("in3")
            .and_then(|meta| meta.get("chainId"))
            .and_then(parse_u64);
        self.calls = calls;
        self.document = document;
        if let Some(chain_id) = chain_id {
            self.set_chain_id(chain_id);
        }
    }

    fn finish_setup(&mut self) {
        if let Err(e) = self.client.init_plugins() {
            self.fail(e.context("plugin initialization failed"));
        }
        ContextCreated {
            request_id: self.id,
            call_count: self.calls.len(),
            chain_id: self.chain_id(),
        }
        .log();
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// The parsed request document (`Null` when parsing failed).
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn calls(&self) -> &[Value] {
        &self.calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn is_batch(&self) -> bool {
        self.document.is_array()
    }

    pub fn method(&self, index: usize) -> Option<&str> {
        self.calls.get(index)?.get("method")?.as_str()
    }

    /// True when the first call is `method`.
    pub fn is_method(&self, method: &str) -> bool {
        self.method(0) == Some(method)
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    /// Chain id from the cache, falling back to the client's.
    pub fn chain_id(&self) -> u64 {
        self.cache
            .chain_id()
            .unwrap_or_else(|| self.client.chain_id())
    }

    /// Override the chain id for this context and its future sub-requests.
    /// Zero and the current value are ignored.
    pub fn set_chain_id(&mut self, chain_id: u64) {
        if chain_id == 0 || chain_id == self.chain_id() {
            return;
        }
        self.cache.set_chain_id(chain_id);
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// The context's error as a [`RequestError`], if it has one.
    pub fn error(&self) -> Option<RequestError> {
        self.error.as_ref().map(|message| {
            RequestError::new(self.error_kind.unwrap_or(ErrorKind::Unknown), message.clone())
        })
    }

    /// Put the context into its error state, prepending `message` to any
    /// message already recorded. Returns the resulting error.
    pub fn set_error(&mut self, kind: ErrorKind, message: &str) -> RequestError {
        let chained = chain_messages(message, self.error.as_deref());
        IntermediateError {
            request_id: self.id,
            kind,
            message: &chained,
        }
        .log();
        self.client.report_error(&ErrorLogEvent {
            request_id: self.id,
            kind,
            message: &chained,
        });
        self.error = Some(chained.clone());
        self.error_kind = Some(kind);
        RequestError::new(kind, chained)
    }

    pub fn fail(&mut self, err: RequestError) -> RequestError {
        self.set_error(err.kind, &err.message)
    }

    pub fn slots(&self) -> &[ResponseSlot] {
        &self.slots
    }

    pub fn state(&self) -> ContextState {
        if self.error.is_some() {
            return ContextState::Error;
        }
        if self.responses.is_some() {
            return ContextState::Success;
        }
        let unsent = self
            .slots
            .iter()
            .any(|s| s.state == SlotState::AwaitingResponse && !s.sent);
        let child_states: Vec<ContextState> = self.required.iter().map(|c| c.state()).collect();
        if self.slots.is_empty() || unsent || child_states.contains(&ContextState::WaitingToSend) {
            return ContextState::WaitingToSend;
        }
        let in_flight = self
            .slots
            .iter()
            .any(|s| s.state == SlotState::AwaitingResponse);
        if in_flight || child_states.contains(&ContextState::WaitingForResponse) {
            ContextState::WaitingForResponse
        } else {
            ContextState::WaitingToSend
        }
    }

    /// Run one step: handle whatever calls can be handled locally, move the
    /// rest to the network and aggregate once every call is answered.
    pub fn advance(&mut self) -> ExecState {
        if self.error.is_some() {
            return ExecState::Error;
        }
        if self.responses.is_some() {
            return ExecState::Success;
        }
        if self.slots.is_empty() {
            self.slots = vec![ResponseSlot::default(); self.calls.len()];
        }
        for child in &mut self.required {
            child.advance();
        }

        for index in 0..self.slots.len() {
            if self.slots[index].state != SlotState::Unresolved {
                continue;
            }
            match self.kind {
                RequestKind::Sign => self.slots[index].state = SlotState::AwaitingResponse,
                RequestKind::Rpc => self.handle_call(index),
            }
            if self.error.is_some() {
                return ExecState::Error;
            }
        }

        self.try_finalize();
        if self.responses.is_some() {
            ExecState::Success
        } else {
            ExecState::Waiting
        }
    }

    fn handle_call(&mut self, index: usize) {
        let call = self.calls[index].clone();
        let Some(method) = call.get("method").and_then(Value::as_str).map(str::to_owned) else {
            self.fail_slot(
                index,
                "",
                RequestError::invalid_parameter("call has no method"),
            );
            return;
        };

        let client = Arc::clone(&self.client);
        let outcome = client
            .plugins()
            .first_success_or_none(Actions::RPC_HANDLE, |plugin| {
                let mut handle = RpcHandleContext {
                    req: &mut *self,
                    index,
                    call: &call,
                };
                plugin.handle_rpc(&mut handle)
            });

        match outcome {
            Ok(Handled::Done(RpcOutcome::Result(result))) => {
                let response = json!({
                    "id": self.call_id(index),
                    "jsonrpc": "2.0",
                    "result": result,
                });
                self.slots[index].resolve(SlotState::Ok, response.to_string().into_bytes());
            }
            Ok(Handled::Done(RpcOutcome::Forward)) => {
                self.slots[index].state = SlotState::AwaitingResponse;
            }
            Ok(Handled::Pending) => {}
            Ok(Handled::Declined) if client.forwards(&method) => {
                self.slots[index].state = SlotState::AwaitingResponse;
            }
            Ok(Handled::Declined) => {
                self.fail_slot(index, &method, RequestError::unsupported_method(&method))
            }
            Err(e) => self.fail_slot(index, &method, e),
        }
    }

    fn fail_slot(&mut self, index: usize, method: &str, err: RequestError) {
        CallFailed {
            request_id: self.id,
            index,
            method,
            error: &err,
        }
        .log();
        self.slots[index].resolve(SlotState::Failed(err.kind), err.message.into_bytes());
    }

    /// The id a call's response carries: its own, or the context id plus its index.
    pub fn call_id(&self, index: usize) -> Value {
        self.calls
            .get(index)
            .and_then(|call| call.get("id"))
            .cloned()
            .unwrap_or_else(|| json!(self.id + index as u64))
    }

    /// Store bytes for a slot. An error arriving after a successful payload
    /// replaces it; otherwise data accumulates.
    pub fn add_response(
        &mut self,
        index: usize,
        status: ResponseStatus,
        data: &[u8],
    ) -> Result<(), RequestError> {
        if self.slots.is_empty() {
            return Err(self.set_error(ErrorKind::InvalidParameter, "no request created yet!"));
        }
        if index >= self.slots.len() {
            return Err(self.set_error(
                ErrorKind::InvalidParameter,
                &format!("response index {} out of range", index),
            ));
        }

        let slot = &mut self.slots[index];
        match status {
            ResponseStatus::Ok => slot.state = SlotState::Ok,
            ResponseStatus::Error(kind) => {
                if slot.state == SlotState::Ok {
                    slot.data.clear();
                }
                slot.state = SlotState::Failed(kind);
            }
        }
        slot.data.extend_from_slice(data);
        self.try_finalize();
        Ok(())
    }

    /// [`add_response`](Self::add_response) on the context at `path`, as
    /// reported in [`OutgoingRequest::path`].
    pub fn add_response_at(
        &mut self,
        path: &[usize],
        index: usize,
        status: ResponseStatus,
        data: &[u8],
    ) -> Result<(), RequestError> {
        match path.split_first() {
            None => self.add_response(index, status, data),
            Some((first, rest)) => match self.required.get_mut(*first) {
                Some(child) => child.add_response_at(rest, index, status, data),
                None => Err(RequestError::invalid_parameter(format!(
                    "no sub-request at position {}",
                    first
                ))),
            },
        }
    }

    /// Collect every payload in this tree that is ready for the network and
    /// has not been collected before.
    pub fn take_outgoing(&mut self) -> Vec<OutgoingRequest> {
        let mut out = Vec::new();
        self.collect_outgoing(&mut Vec::new(), &mut out);
        out
    }

    fn collect_outgoing(&mut self, path: &mut Vec<usize>, out: &mut Vec<OutgoingRequest>) {
        if self.error.is_some() {
            return;
        }
        for position in 0..self.required.len() {
            path.push(position);
            self.required[position].collect_outgoing(path, out);
            path.pop();
        }

        let chain_id = self.chain_id();
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            if slot.state != SlotState::AwaitingResponse || slot.sent {
                continue;
            }
            self.slots[index].sent = true;
            out.push(OutgoingRequest {
                path: path.clone(),
                index,
                request_id: self.id,
                method: self.method(index).unwrap_or_default().to_string(),
                chain_id,
                kind: self.kind,
                payload: self.outgoing_payload(index),
            });
        }
    }

    fn outgoing_payload(&self, index: usize) -> String {
        let mut call = self.calls[index].clone();
        if let Value::Object(fields) = &mut call {
            fields
                .entry("jsonrpc")
                .or_insert_with(|| json!("2.0"));
            if !fields.contains_key("id") {
                fields.insert("id".into(), self.call_id(index));
            }
        }
        call.to_string()
    }

    fn try_finalize(&mut self) {
        if self.responses.is_some()
            || self.slots.is_empty()
            || !self.slots.iter().all(|s| s.state.is_terminal())
        {
            return;
        }
        let responses: Vec<Value> = (0..self.slots.len())
            .map(|index| self.build_response(index))
            .collect();
        let failed_calls = responses.iter().filter(|r| r.get("error").is_some()).count();
        self.responses = Some(responses);
        ContextCompleted {
            request_id: self.id,
            call_count: self.calls.len(),
            failed_calls,
        }
        .log();
    }

    fn build_response(&self, index: usize) -> Value {
        let slot = &self.slots[index];
        match (slot.state, self.kind) {
            (SlotState::Ok, RequestKind::Sign) => json!({
                "id": self.call_id(index),
                "jsonrpc": "2.0",
                "result": to_hex_prefixed(&slot.data),
            }),
            (SlotState::Ok, RequestKind::Rpc) => match serde_json::from_slice::<Value>(&slot.data) {
                Ok(Value::Object(mut fields)) => {
                    if !self.client.keep_in3() {
                        fields.remove("in3");
                    }
                    Value::Object(fields)
                }
                Ok(_) => self.error_object(
                    index,
                    ErrorKind::ParseError,
                    "invalid response: expected a JSON object",
                ),
                Err(e) => self.error_object(
                    index,
                    ErrorKind::ParseError,
                    &format!("invalid response: {}", e),
                ),
            },
            (SlotState::Failed(kind), _) => {
                let message = if slot.data.is_empty() {
                    kind.to_string()
                } else {
                    String::from_utf8_lossy(&slot.data).into_owned()
                };
                self.error_object(index, kind, &message)
            }
            _ => Value::Null,
        }
    }

    fn error_object(&self, index: usize, kind: ErrorKind, message: &str) -> Value {
        json!({
            "id": self.call_id(index),
            "jsonrpc": "2.0",
            "error": { "code": kind.rpc_code(), "message": message },
        })
    }

    /// Per-call response objects, once every call is answered.
    pub fn responses(&self) -> Option<&[Value]> {
        self.responses.as_deref()
    }

    /// `result` of call `index`, if it succeeded.
    pub fn result(&self, index: usize) -> Option<&Value> {
        self.responses.as_ref()?.get(index)?.get("result")
    }

    pub fn call_status(&self, index: usize) -> CallStatus {
        if self.error.is_some() {
            return CallStatus::Failed(self.error_kind.unwrap_or(ErrorKind::RemoteError));
        }
        if index >= self.calls.len() {
            return CallStatus::Failed(ErrorKind::InvalidParameter);
        }
        if let Some(response) = self.responses.as_ref().and_then(|r| r.get(index)) {
            return match response.get("error") {
                Some(error) => CallStatus::Failed(ErrorKind::from_rpc_code(
                    error.get("code").and_then(Value::as_i64).unwrap_or(-32603),
                )),
                None => CallStatus::Ok,
            };
        }
        match self.slots.get(index).map(|s| s.state) {
            Some(SlotState::Failed(kind)) => CallStatus::Failed(kind),
            _ => CallStatus::Pending,
        }
    }

    /// `Err` carrying the remote error of call `index`, if its response has one.
    pub fn check_response_error(&self, index: usize) -> Result<(), RequestError> {
        let Some(error) = self
            .responses
            .as_ref()
            .and_then(|r| r.get(index))
            .and_then(|response| response.get("error"))
        else {
            return Ok(());
        };
        let kind = ErrorKind::from_rpc_code(error.get("code").and_then(Value::as_i64).unwrap_or(-32000));
        let message = match error.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => match error {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
        };
        Err(RequestError::new(kind, message))
    }

    /// The final document: one response object, an array for batches, or an
    /// error object when the context itself failed. `None` while waiting.
    pub fn response_value(&self) -> Option<Value> {
        if let Some(message) = &self.error {
            let kind = self.error_kind.unwrap_or(ErrorKind::Unknown);
            let mut fields = Map::new();
            fields.insert("id".into(), json!(self.id));
            fields.insert("jsonrpc".into(), json!("2.0"));
            fields.insert(
                "error".into(),
                json!({ "code": kind.rpc_code(), "message": message }),
            );
            return Some(Value::Object(fields));
        }
        let responses = self.responses.as_ref()?;
        if self.is_batch() {
            Some(Value::Array(responses.clone()))
        } else {
            responses.first().cloned()
        }
    }

    pub fn response_json(&self) -> Option<String> {
        self.response_value().map(|value| value.to_string())
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        self.client.release_pending();
    }
}
