// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for sub-request resolution.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A new required child was created.
///
/// # Log Level
/// `debug!`
pub struct SubRequestSpawned<'a> {
    pub parent_id: u64,
    pub child_id: u64,
    pub method: &'a str,
    pub dedup: &'a str,
    pub inherited_entries: usize,
}

impl Display for SubRequestSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} requires '{}' as request {} (dedup={}, inherited {} cache entries)",
            self.parent_id, self.method, self.child_id, self.dedup, self.inherited_entries
        )
    }
}

impl StructuredLog for SubRequestSpawned<'_> {
    fn log(&self) {
        tracing::debug!(
            parent_id = self.parent_id,
            child_id = self.child_id,
            method = self.method,
            dedup = self.dedup,
            inherited_entries = self.inherited_entries,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "sub_request",
            span_name = name,
            parent_id = self.parent_id,
            child_id = self.child_id,
            method = self.method,
        )
    }
}

/// An existing child satisfied a requirement.
///
/// # Log Level
/// `trace!` - Emitted on every re-poll of a waiting parent
pub struct SubRequestMatched<'a> {
    pub parent_id: u64,
    pub child_id: u64,
    pub method: &'a str,
    pub state: &'a str,
}

impl Display for SubRequestMatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} reuses request {} for '{}' (state {})",
            self.parent_id, self.child_id, self.method, self.state
        )
    }
}

impl StructuredLog for SubRequestMatched<'_> {
    fn log(&self) {
        tracing::trace!(
            parent_id = self.parent_id,
            child_id = self.child_id,
            method = self.method,
            state = self.state,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "sub_request_matched",
            span_name = name,
            parent_id = self.parent_id,
            child_id = self.child_id,
        )
    }
}
