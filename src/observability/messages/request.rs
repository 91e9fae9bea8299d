// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for request context lifecycle events.

use crate::errors::ErrorKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A context was created from a JSON-RPC document.
///
/// # Log Level
/// `debug!` - Happens for every root and every sub-request
pub struct ContextCreated {
    pub request_id: u64,
    pub call_count: usize,
    pub chain_id: u64,
}

impl Display for ContextCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created request context {} with {} call(s) on chain {}",
            self.request_id, self.call_count, self.chain_id
        )
    }
}

impl StructuredLog for ContextCreated {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id,
            call_count = self.call_count,
            chain_id = self.chain_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "request",
            span_name = name,
            request_id = self.request_id,
            call_count = self.call_count,
            chain_id = self.chain_id,
        )
    }
}

/// The input could not be turned into a context.
///
/// # Log Level
/// `error!` - The caller sent something unusable
pub struct InvalidRequest<'a> {
    pub reason: &'a str,
    pub input: &'a str,
}

impl Display for InvalidRequest<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Invalid json-request ({}): {}", self.reason, self.input)
    }
}

impl StructuredLog for InvalidRequest<'_> {
    fn log(&self) {
        tracing::error!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("invalid_request", span_name = name, reason = self.reason)
    }
}

/// The pending-context bound refused a new context.
///
/// # Log Level
/// `warn!` - Usually a runaway sub-request loop
pub struct PendingLimitReached {
    pub pending: usize,
    pub limit: usize,
}

impl Display for PendingLimitReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Refusing to create request context: {} pending, limit {}",
            self.pending, self.limit
        )
    }
}

impl StructuredLog for PendingLimitReached {
    fn log(&self) {
        tracing::warn!(pending = self.pending, limit = self.limit, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "pending_limit",
            span_name = name,
            pending = self.pending,
            limit = self.limit,
        )
    }
}

/// An error was recorded on a context.
///
/// # Log Level
/// `trace!` - Intermediate errors are common and often recovered by callers
pub struct IntermediateError<'a> {
    pub request_id: u64,
    pub kind: ErrorKind,
    pub message: &'a str,
}

impl Display for IntermediateError<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Intermediate error on request {} ({}) -> {}",
            self.request_id, self.kind, self.message
        )
    }
}

impl StructuredLog for IntermediateError<'_> {
    fn log(&self) {
        tracing::trace!(
            request_id = self.request_id,
            kind = %self.kind,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "intermediate_error",
            span_name = name,
            request_id = self.request_id,
            kind = %self.kind,
        )
    }
}

/// One call of a context failed without affecting its siblings.
///
/// # Log Level
/// `debug!`
pub struct CallFailed<'a> {
    pub request_id: u64,
    pub index: usize,
    pub method: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call {} ('{}') of request {} failed: {}",
            self.index, self.method, self.request_id, self.error
        )
    }
}

impl StructuredLog for CallFailed<'_> {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id,
            index = self.index,
            method = self.method,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "call_failed",
            span_name = name,
            request_id = self.request_id,
            index = self.index,
            method = self.method,
        )
    }
}

/// All response slots were filled and parsed.
///
/// # Log Level
/// `debug!`
pub struct ContextCompleted {
    pub request_id: u64,
    pub call_count: usize,
    pub failed_calls: usize,
}

impl Display for ContextCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} completed: {} call(s), {} failed",
            self.request_id, self.call_count, self.failed_calls
        )
    }
}

impl StructuredLog for ContextCompleted {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id,
            call_count = self.call_count,
            failed_calls = self.failed_calls,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "request_completed",
            span_name = name,
            request_id = self.request_id,
        )
    }
}
