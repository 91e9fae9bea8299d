// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::errors::RequestError;
use crate::plugins::{Actions, Handled, PluginResult, SignRequest};
use crate::traits::{KeyPair, Plugin};

/// Signs with a single in-process key.
///
/// Declines requests for any other account so several key signers can be
/// registered side by side.
pub struct KeySigner {
    key: Arc<dyn KeyPair>,
}

impl KeySigner {
    /// Actions for a wallet key. The same key also signs outgoing requests
    /// for a payment provider.
    pub const ACTIONS: Actions = Actions::SIGN
        .union(Actions::SIGN_ACCOUNT)
        .union(Actions::SIGN_PUBLICKEY)
        .union(Actions::PAY_SIGN_REQ)
        .union(Actions::TERM);

    pub fn new(key: Arc<dyn KeyPair>) -> Self {
        Self { key }
    }

    fn owns(&self, account: &[u8]) -> bool {
        account == &self.key.address()[..]
    }
}

impl Plugin for KeySigner {
    fn name(&self) -> &'static str {
        "key_signer"
    }

    fn sign(&self, request: &SignRequest<'_>) -> PluginResult<Vec<u8>> {
        if !request.account.is_empty() && !self.owns(request.account) {
            return Ok(Handled::Declined);
        }
        let digest = request.digest.digest(request.message)?;
        Ok(Handled::Done(self.key.sign_digest(&digest)?))
    }

    fn sign_accounts(&self) -> PluginResult<Vec<Vec<u8>>> {
        Ok(Handled::Done(vec![self.key.address().to_vec()]))
    }

    fn sign_public_key(&self, account: Option<&[u8]>) -> PluginResult<Vec<u8>> {
        match account {
            Some(account) if !self.owns(account) => Ok(Handled::Declined),
            _ => Ok(Handled::Done(self.key.public_key())),
        }
    }

    fn sign_payment(&self, request_hash: &[u8; 32]) -> PluginResult<Vec<u8>> {
        let mut signature = self.key.sign_digest(request_hash)?;
        let recovery = signature
            .get_mut(64)
            .ok_or_else(|| RequestError::invalid_parameter("signature is shorter than 65 bytes"))?;
        *recovery += 27;
        Ok(Handled::Done(signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubKeyPair;
    use crate::signer::{CurveType, DigestType, PayloadType};

    fn request<'a>(account: &'a [u8], message: &'a [u8], digest: DigestType) -> SignRequest<'a> {
        SignRequest {
            request_id: 1,
            account,
            message,
            digest,
            payload: PayloadType::Any,
            curve: CurveType::Secp256k1,
            meta: None,
        }
    }

    #[test]
    fn test_signs_for_own_account() {
        let key = StubKeyPair::new(3);
        let signer = KeySigner::new(Arc::new(key.clone()));
        let address = key.address();

        let result = signer.sign(&request(&address, b"hello", DigestType::Hash)).unwrap();
        let expected = key
            .sign_digest(&DigestType::Hash.digest(b"hello").unwrap())
            .unwrap();
        assert_eq!(result, Handled::Done(expected));
    }

    #[test]
    fn test_declines_foreign_account() {
        let signer = KeySigner::new(Arc::new(StubKeyPair::new(3)));
        let other = StubKeyPair::new(4).address();
        assert_eq!(
            signer.sign(&request(&other, b"hello", DigestType::Hash)).unwrap(),
            Handled::Declined
        );
        assert_eq!(signer.sign_public_key(Some(&other)).unwrap(), Handled::Declined);
    }

    #[test]
    fn test_raw_digest_length_is_checked() {
        let key = StubKeyPair::new(3);
        let signer = KeySigner::new(Arc::new(key.clone()));
        let address = key.address();
        assert!(signer.sign(&request(&address, b"short", DigestType::Raw)).is_err());
    }

    #[test]
    fn test_payment_signature_uses_ethereum_recovery_id() {
        let key = StubKeyPair::new(9);
        let signer = KeySigner::new(Arc::new(key.clone()));
        let hash = [1u8; 32];

        let Handled::Done(signature) = signer.sign_payment(&hash).unwrap() else {
            panic!("expected a signature");
        };
        let plain = key.sign_digest(&hash).unwrap();
        assert_eq!(signature[..64], plain[..64]);
        assert_eq!(signature[64], plain[64] + 27);
    }
}
