// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod accounts;
pub mod digest;
pub mod key_signer;
pub mod transaction;

pub use accounts::AccountsHandler;
pub use digest::DigestHandler;
pub use key_signer::KeySigner;
pub use transaction::TransactionHandler;
