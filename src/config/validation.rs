// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::local::LocalPluginFactory;
use crate::config::ClientConfig;
use crate::errors::ConfigError;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Reject configurations the client cannot run with.
pub fn validate_config(cfg: &ClientConfig) -> Result<(), ConfigError> {
    if cfg.chain_id == 0 {
        return Err(invalid("chain_id", "must be non-zero"));
    }
    if cfg.max_pending == 0 {
        return Err(invalid("max_pending", "must allow at least one context"));
    }
    if cfg.driver.max_rounds == Some(0) {
        return Err(invalid("driver.max_rounds", "must be at least 1"));
    }
    if cfg.driver.timeout_seconds == Some(0) {
        return Err(invalid("driver.timeout_seconds", "must be at least 1"));
    }
    if cfg.forward.methods.iter().any(|m| m.trim().is_empty()) {
        return Err(invalid("forward.methods", "prefixes must not be empty"));
    }
    if let Some(name) = cfg
        .local_plugins
        .iter()
        .find(|name| !LocalPluginFactory::is_plugin_available(name))
    {
        return Err(invalid(
            "local_plugins",
            &format!("unknown plugin '{}'", name),
        ));
    }
    Ok(())
}
