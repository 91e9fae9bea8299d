// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request contexts and everything they own: the per-call response slots,
//! the property-tagged cache and the tree of required sub-requests.

mod cache;
mod context;
mod resolver;
mod state;

#[cfg(test)]
mod integration_tests;

pub use cache::{Cache, CacheEntry, CacheProps};
pub use context::RequestContext;
pub use resolver::{DedupMode, Resolution, SubRequest};
pub use state::{
    CallStatus, ContextState, ExecState, OutgoingRequest, RequestKind, ResponseSlot,
    ResponseStatus, SlotState,
};
