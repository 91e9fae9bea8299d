// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::RequestError;

/// A private key held by a signer backend.
///
/// Curve arithmetic lives behind this trait; the engine only needs an
/// address to match against and a recoverable signature over a digest.
pub trait KeyPair: Send + Sync {
    /// The 20-byte account address derived from the key.
    fn address(&self) -> [u8; 20];

    fn public_key(&self) -> Vec<u8>;

    /// Sign a 32-byte digest. Returns `r ‖ s ‖ v` (65 bytes) with `v` in `{0, 1}`.
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, RequestError>;
}
