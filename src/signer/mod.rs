// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod digest;
mod protocol;

pub use digest::{keccak256, prefixed_message_hash, CurveType, DigestType, PayloadType};
pub use protocol::SignatureSpec;
