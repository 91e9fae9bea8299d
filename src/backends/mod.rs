// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plugin backends.
//!
//! ## Local Backend
//! In-process plugins registered on a [`crate::client::Client`]:
//! - **KeySigner**: signs with a [`crate::traits::KeyPair`], lists its account,
//!   exposes its public key and signs payment requests
//! - **AccountsHandler**: `eth_accounts` over every registered signer, or the
//!   node's answer when none is registered
//! - **TransactionHandler**: `eth_sendTransaction` and `eth_sign` via the signing protocol
//! - **DigestHandler**: `web3_sha3` and `sha256` computed locally
//!
//! The RPC handlers can be created by name through [`local::LocalPluginFactory`],
//! which is what the `local_plugins` config list uses.
//!
//! ## Replay Backend
//! [`replay::ReplayTransport`] answers outgoing payloads from a recording file,
//! which lets the binary run requests without a network.
//!
//! ## Stub Backend (Test-Only)
//! Recording plugins, scripted signers, a deterministic key and a mock
//! transport. Only compiled for tests.

pub mod local;
pub mod replay;
#[cfg(test)]
pub mod stub;

pub use local::{AccountsHandler, DigestHandler, KeySigner, LocalPluginFactory, TransactionHandler};
pub use replay::ReplayTransport;
