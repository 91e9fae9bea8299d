// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error vocabulary shared by request contexts, the resolver, plugins and the
//! signing protocol.

use std::fmt;
use thiserror::Error;

/// Separator placed between an outer message and the message it wraps.
pub const ERROR_DELIMITER: char = ':';

/// Classification of a failure.
///
/// Every kind maps to the JSON-RPC error code written into per-call error
/// objects, so a batch response can report each failed call independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed JSON or a document that is neither an object nor an array.
    ParseError,
    InvalidParameter,
    /// No registered plugin claimed the RPC method.
    UnsupportedMethod,
    /// The remote side of a sub-request reported an error.
    RemoteError,
    /// The client refuses to create more contexts.
    ResourceExhausted,
    /// A capability exists in the vocabulary but is not implemented.
    NotSupported,
    Unknown,
}

impl ErrorKind {
    /// JSON-RPC error code used in response error objects.
    pub fn rpc_code(self) -> i64 {
        match self {
            ErrorKind::ParseError => -32700,
            ErrorKind::InvalidParameter => -32602,
            ErrorKind::UnsupportedMethod => -32601,
            ErrorKind::RemoteError => -32000,
            ErrorKind::ResourceExhausted => -32005,
            ErrorKind::NotSupported => -32004,
            ErrorKind::Unknown => -32603,
        }
    }

    /// Reverse of [`ErrorKind::rpc_code`]; unknown codes are remote failures.
    pub fn from_rpc_code(code: i64) -> Self {
        match code {
            -32700 => ErrorKind::ParseError,
            -32602 => ErrorKind::InvalidParameter,
            -32601 => ErrorKind::UnsupportedMethod,
            -32005 => ErrorKind::ResourceExhausted,
            -32004 => ErrorKind::NotSupported,
            -32603 => ErrorKind::Unknown,
            _ => ErrorKind::RemoteError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ParseError => "parse error",
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::UnsupportedMethod => "unsupported method",
            ErrorKind::RemoteError => "remote error",
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::NotSupported => "not supported",
            ErrorKind::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

/// A failure carrying its kind and an accumulated, human-readable message.
///
/// Messages chain: wrapping an error with [`RequestError::context`] prepends the
/// outer description, so `"sign transaction:bad signature"` reads from the
/// operation that gave up down to the failure that caused it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedMethod,
            format!("The method '{}' is not supported", method),
        )
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteError, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    /// Wrap this error in an outer operation's description.
    pub fn context(self, outer: &str) -> Self {
        Self {
            kind: self.kind,
            message: chain_messages(outer, Some(&self.message)),
        }
    }
}

/// Join an outer message onto an existing one.
pub(crate) fn chain_messages(outer: &str, existing: Option<&str>) -> String {
    match existing {
        Some(inner) if !inner.is_empty() => format!("{}{}{}", outer, ERROR_DELIMITER, inner),
        _ => outer.to_string(),
    }
}
