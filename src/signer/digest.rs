// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Digest, curve and payload descriptors for signature requests.

use sha2::{Digest as _, Sha256};
use sha3::Keccak256;

use crate::errors::RequestError;

const ETH_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// How the message is turned into the 32 bytes that get signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestType {
    /// The message already is the digest.
    Raw,
    /// keccak256 of the message.
    Hash,
    /// keccak256 of the Ethereum signed-message envelope.
    Prefix,
    /// Double sha256.
    Btc,
}

impl DigestType {
    /// RPC method used when the signature is delegated to a remote signer.
    pub fn method_name(self) -> &'static str {
        match self {
            DigestType::Raw => "sign_ec_raw",
            DigestType::Hash => "sign_ec_hash",
            DigestType::Prefix => "sign_ec_prefix",
            DigestType::Btc => "sign_ec_btc",
        }
    }

    pub fn digest(self, message: &[u8]) -> Result<[u8; 32], RequestError> {
        match self {
            DigestType::Raw => <[u8; 32]>::try_from(message).map_err(|_| {
                RequestError::invalid_parameter(format!(
                    "raw signing needs a 32 byte digest, got {} bytes",
                    message.len()
                ))
            }),
            DigestType::Hash => Ok(keccak256(message)),
            DigestType::Prefix => Ok(prefixed_message_hash(message)),
            DigestType::Btc => Ok(Sha256::digest(Sha256::digest(message)).into()),
        }
    }
}

/// Curve the signature is made on. Only secp256k1 is requested today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveType {
    Secp256k1 = 1,
}

/// What the signed bytes represent; lets a signer show or police the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    Any = 0,
    EthTx = 1,
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// keccak256("\x19Ethereum Signed Message:\n" ‖ len(message) ‖ message)
pub fn prefixed_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(ETH_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}
