// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Display, Formatter};

use crate::errors::ErrorKind;

/// What kind of work a context carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// JSON-RPC calls, answered by plugins or the network.
    Rpc,
    /// A signature request that always goes to a remote signer.
    Sign,
}

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Calls or sub-requests still need to be handled or sent.
    WaitingToSend,
    /// Everything is sent; responses are outstanding.
    WaitingForResponse,
    Success,
    Error,
}

impl Display for ContextState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContextState::WaitingToSend => "waiting_to_send",
            ContextState::WaitingForResponse => "waiting_for_response",
            ContextState::Success => "success",
            ContextState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Result of one [`crate::request::RequestContext::advance`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Waiting,
    Success,
    Error,
}

/// Status of a single call in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Pending,
    Ok,
    Failed(ErrorKind),
}

/// Status attached to bytes delivered for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Error(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Not handled yet.
    #[default]
    Unresolved,
    /// Handed to the network, no answer yet.
    AwaitingResponse,
    Ok,
    Failed(ErrorKind),
}

impl SlotState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SlotState::Ok | SlotState::Failed(_))
    }
}

/// Raw response storage for one call.
#[derive(Debug, Clone, Default)]
pub struct ResponseSlot {
    pub state: SlotState,
    pub data: Vec<u8>,
    /// Set once the slot's payload has been collected for sending.
    pub sent: bool,
}

impl ResponseSlot {
    pub(crate) fn resolve(&mut self, state: SlotState, data: Vec<u8>) {
        self.state = state;
        self.data = data;
    }
}

/// A payload the context wants delivered to the network.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    /// Indices into nested `required` lists, from the root to the owning context.
    pub path: Vec<usize>,
    /// Slot within the owning context.
    pub index: usize,
    pub request_id: u64,
    pub method: String,
    pub chain_id: u64,
    pub kind: RequestKind,
    /// JSON text of the call to send.
    pub payload: String,
}
