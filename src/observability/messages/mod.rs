// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for emitting it with typed fields at its natural level.

use tracing::Span;

pub mod driver;
pub mod plugin;
pub mod request;
pub mod resolver;
pub mod signer;

/// A log event that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the event at its level.
    fn log(&self);

    /// Open a span carrying the same fields.
    fn span(&self, name: &str) -> Span;
}
