// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the signing protocol.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A signature is being requested.
///
/// # Log Level
/// `debug!`
pub struct SignatureRequested<'a> {
    pub request_id: u64,
    pub digest: &'a str,
    pub account: &'a str,
}

impl Display for SignatureRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} requires a {} signature from account {}",
            self.request_id, self.digest, self.account
        )
    }
}

impl StructuredLog for SignatureRequested<'_> {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id,
            digest = self.digest,
            account = self.account,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "signature",
            span_name = name,
            request_id = self.request_id,
            digest = self.digest,
        )
    }
}

/// No local plugin signed; a remote signer sub-request is used instead.
///
/// # Log Level
/// `debug!`
pub struct SignatureDelegated<'a> {
    pub request_id: u64,
    pub method: &'a str,
}

impl Display for SignatureDelegated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Nobody picked up the signature for request {}, delegating to '{}'",
            self.request_id, self.method
        )
    }
}

impl StructuredLog for SignatureDelegated<'_> {
    fn log(&self) {
        tracing::debug!(request_id = self.request_id, method = self.method, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "signature_delegated",
            span_name = name,
            request_id = self.request_id,
            method = self.method,
        )
    }
}
