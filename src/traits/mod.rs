// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod crypto;
pub mod plugin;
pub mod transport;

pub use crypto::KeyPair;
pub use plugin::Plugin;
pub use transport::Transport;
