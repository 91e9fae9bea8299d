// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while loading or validating a client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension does not name a supported format.
    #[error("Unsupported configuration format '{extension}', expected yaml, yml, toml or json")]
    UnsupportedFormat { extension: String },

    /// A value is syntactically fine but semantically unusable.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
