// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::request::OutgoingRequest;

/// Delivers one outgoing payload and returns the raw response bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &OutgoingRequest) -> Result<Vec<u8>, TransportError>;

    fn name(&self) -> &'static str;
}
