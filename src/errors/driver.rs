// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

use super::{ErrorKind, RequestError};

/// Errors that end a driver run before the root context finished.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// The root context ended in its error state.
    #[error("request failed ({kind}): {message}")]
    RequestFailed { kind: ErrorKind, message: String },

    #[error("transport failed for '{method}': {reason}")]
    Transport { method: String, reason: String },

    #[error("transport timed out after {0:?}")]
    Timeout(Duration),

    /// The context keeps waiting but nothing is outstanding on the network.
    #[error("request stalled: waiting with nothing to send")]
    Stalled,

    #[error("request did not finish within {0} rounds")]
    RoundsExceeded(usize),
}

impl From<RequestError> for DriverError {
    fn from(err: RequestError) -> Self {
        DriverError::RequestFailed {
            kind: err.kind,
            message: err.message,
        }
    }
}

/// A transport could not deliver a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
