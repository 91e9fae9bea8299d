// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for driver rounds.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A round started shipping outgoing calls.
///
/// # Log Level
/// `debug!`
pub struct RoundStarted {
    pub request_id: u64,
    pub round: usize,
    pub outgoing: usize,
}

impl Display for RoundStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} round {}: sending {} call(s)",
            self.request_id, self.round, self.outgoing
        )
    }
}

impl StructuredLog for RoundStarted {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id,
            round = self.round,
            outgoing = self.outgoing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "round",
            span_name = name,
            request_id = self.request_id,
            round = self.round,
        )
    }
}

/// The transport reported a failure for one call.
///
/// # Log Level
/// `warn!`
pub struct TransportFailed<'a> {
    pub method: &'a str,
    pub reason: &'a str,
}

impl Display for TransportFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transport failed for '{}': {}", self.method, self.reason)
    }
}

impl StructuredLog for TransportFailed<'_> {
    fn log(&self) {
        tracing::warn!(method = self.method, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("transport_failed", span_name = name, method = self.method)
    }
}

/// The driver finished a request.
///
/// # Log Level
/// `info!`
pub struct RequestFinished {
    pub request_id: u64,
    pub rounds: usize,
    pub success: bool,
    pub duration: Duration,
}

impl Display for RequestFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} finished after {} round(s) in {:?}: {}",
            self.request_id,
            self.rounds,
            self.duration,
            if self.success { "success" } else { "error" }
        )
    }
}

impl StructuredLog for RequestFinished {
    fn log(&self) {
        tracing::info!(
            request_id = self.request_id,
            rounds = self.rounds,
            success = self.success,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "request_finished",
            span_name = name,
            request_id = self.request_id,
            duration = ?self.duration,
        )
    }
}
