// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::plugins::*;
use crate::plugins::Actions;
use crate::traits::Plugin;

/// Creates the built-in RPC plugins by name.
///
/// Signers need key material and are registered directly with
/// [`KeySigner::new`].
pub struct LocalPluginFactory;

impl LocalPluginFactory {
    /// - "accounts" -> AccountsHandler (`eth_accounts`)
    /// - "digest" -> DigestHandler (`web3_sha3`, `sha256`)
    /// - "transaction" -> TransactionHandler (`eth_sendTransaction`, `eth_sign`)
    pub fn create_plugin(name: &str) -> Result<(Actions, Arc<dyn Plugin>), String> {
        match name {
            "accounts" => Ok((AccountsHandler::ACTIONS, Arc::new(AccountsHandler::new()))),
            "digest" => Ok((DigestHandler::ACTIONS, Arc::new(DigestHandler::new()))),
            "transaction" => Ok((TransactionHandler::ACTIONS, Arc::new(TransactionHandler::new()))),
            _ => Err(format!("Unknown local plugin: '{}'", name)),
        }
    }

    pub fn list_available_plugins() -> Vec<&'static str> {
        vec!["accounts", "digest", "transaction"]
    }

    pub fn is_plugin_available(name: &str) -> bool {
        Self::list_available_plugins().contains(&name)
    }
}
