// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic event is a small struct with a `Display` implementation and
//! a [`messages::StructuredLog`] implementation that emits it with structured
//! fields. This keeps message text in one place instead of scattering format
//! strings across the request engine.
//!
//! Messages are organized by subsystem:
//! * `messages::request` - context creation, errors and completion
//! * `messages::resolver` - sub-request matching and spawning
//! * `messages::plugin` - registration and dispatch
//! * `messages::signer` - signature requests
//! * `messages::driver` - network rounds driven against a transport
//!
//! # Usage
//!
//! ```rust
//! use lightwire::observability::messages::{request::ContextCreated, StructuredLog};
//!
//! ContextCreated {
//!     request_id: 7,
//!     call_count: 2,
//!     chain_id: 1,
//! }
//! .log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`.
///
/// Returns `false` when a global subscriber was already installed; calling it
/// twice is harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
