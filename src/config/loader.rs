// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_CHAIN_ID, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PENDING, DEFAULT_MAX_ROUNDS,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::errors::ConfigError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Client configuration.
///
/// Loaded from YAML, TOML or JSON; every field is optional and falls back to the
/// defaults in [`crate::config::consts`].
///
/// # Example
/// ```yaml
/// chain_id: 1
/// max_pending: 1024
/// keep_in3: false
/// forward:
///   methods: ["eth_", "net_"]
/// driver:
///   timeout_seconds: 10
///   max_rounds: 32
/// local_plugins: ["accounts", "transaction"]
/// plugins:
///   signer_label: "hot wallet"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Keep the `in3` section of each response in the aggregated output
    #[serde(default)]
    pub keep_in3: bool,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub driver: DriverOptions,
    /// Built-in plugins to register, by factory name
    #[serde(default)]
    pub local_plugins: Vec<String>,
    /// Plugin-specific settings, handed to plugins through `CONFIG_SET`
    #[serde(default)]
    pub plugins: BTreeMap<String, serde_json::Value>,
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            max_pending: DEFAULT_MAX_PENDING,
            keep_in3: false,
            forward: ForwardConfig::default(),
            driver: DriverOptions::default(),
            local_plugins: Vec::new(),
            plugins: BTreeMap::new(),
        }
    }
}

/// Methods the client hands to the network instead of answering locally.
///
/// Each entry is a method-name prefix; `"eth_"` forwards every `eth_*` call that
/// no local plugin answered first.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ForwardConfig {
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Options for [`crate::engine::RequestDriver`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DriverOptions {
    pub timeout_seconds: Option<u64>,
    pub max_rounds: Option<usize>,
    pub max_concurrency: Option<usize>,
}

impl DriverOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY).max(1)
    }
}

/// Parse a configuration document, picking the format from `extension`.
pub fn parse_config(content: &str, extension: &str) -> Result<ClientConfig, ConfigError> {
    parse_str(content, extension)
}

fn parse_str<T: DeserializeOwned>(content: &str, extension: &str) -> Result<T, ConfigError> {
    match extension {
        "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

/// Read and deserialize a YAML, TOML or JSON file.
pub fn parse_document<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(ConfigError::from)
        .with_context(|| format!("reading {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let document = parse_str(&content, &extension)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(document)
}

/// Load a config from a YAML, TOML or JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<ClientConfig> {
    parse_document(path)
}

/// Load and validate a config file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> anyhow::Result<ClientConfig> {
    let path = path.as_ref();
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg)
        .with_context(|| format!("validating config file {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_apply_to_empty_yaml() {
        let cfg = parse_config("{}", "yaml").unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.driver.max_rounds(), DEFAULT_MAX_ROUNDS);
        assert_eq!(cfg.driver.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));
    }

    #[test]
    fn test_parse_yaml_and_toml_agree() {
        let yaml = r#"
chain_id: 5
max_pending: 10
forward:
  methods: ["eth_"]
driver:
  max_rounds: 3
local_plugins: ["accounts"]
plugins:
  label: "hot"
"#;
        let toml_doc = r#"
chain_id = 5
max_pending = 10
local_plugins = ["accounts"]

[forward]
methods = ["eth_"]

[driver]
max_rounds = 3

[plugins]
label = "hot"
"#;
        let from_yaml = parse_config(yaml, "yaml").unwrap();
        let from_toml = parse_config(toml_doc, "toml").unwrap();
        assert_eq!(from_yaml, from_toml);
        assert_eq!(from_yaml.chain_id, 5);
        assert_eq!(from_yaml.plugins.get("label"), Some(&serde_json::json!("hot")));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_config("{}", "ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_and_validate_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "chain_id: 137\nkeep_in3: true").unwrap();

        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.chain_id, 137);
        assert!(cfg.keep_in3);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "max_pending: 0").unwrap();

        let err = load_and_validate_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("max_pending"));
    }
}
