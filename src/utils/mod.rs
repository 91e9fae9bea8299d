// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bytes;

pub use bytes::{decode_hex, to_hex, to_hex_prefixed, value_bytes};
