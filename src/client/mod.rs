// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The client: shared settings, plugin registry and request bookkeeping.
//!
//! A [`Client`] is shared by every [`crate::request::RequestContext`] created
//! on it (`Arc<Client>`). It owns the plugins, the pending-context counter and
//! the id sequence. Dropping the last handle tears the plugins down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};

use crate::backends::local::LocalPluginFactory;
use crate::config::consts::FIRST_REQUEST_ID;
use crate::config::{validate_config, ClientConfig, DriverOptions};
use crate::errors::{ConfigError, ErrorKind, RequestError};
use crate::observability::messages::plugin::ClientTeardown;
use crate::observability::messages::request::PendingLimitReached;
use crate::observability::messages::StructuredLog;
use crate::plugins::{Actions, ErrorLogEvent, Handled, PluginRegistry};
use crate::traits::Plugin;

#[derive(Debug, Clone)]
struct Settings {
    chain_id: u64,
    max_pending: usize,
    keep_in3: bool,
    forward: Vec<String>,
}

struct Counters {
    pending: usize,
    next_id: u64,
}

pub struct Client {
    settings: RwLock<Settings>,
    driver: DriverOptions,
    plugins: PluginRegistry,
    counters: Mutex<Counters>,
    terminated: AtomicBool,
}

impl Client {
    /// A client with default settings and no plugins.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::from_parts(ClientConfig::default()))
    }

    /// A client from a validated configuration. Plugin settings in
    /// `config.plugins` need registered plugins to claim them; use
    /// [`ClientBuilder`] when the config carries any.
    pub fn from_config(config: ClientConfig) -> Result<Arc<Self>, ConfigError> {
        validate_config(&config)?;
        Ok(Arc::new(Self::from_parts(config)))
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    fn from_parts(config: ClientConfig) -> Self {
        Self {
            settings: RwLock::new(Settings {
                chain_id: config.chain_id,
                max_pending: config.max_pending,
                keep_in3: config.keep_in3,
                forward: config.forward.methods,
            }),
            driver: config.driver,
            plugins: PluginRegistry::new(),
            counters: Mutex::new(Counters {
                pending: 0,
                next_id: FIRST_REQUEST_ID,
            }),
            terminated: AtomicBool::new(false),
        }
    }

    /// Attach a plugin for the given actions. Dispatch follows registration order.
    pub fn register(&self, actions: Actions, plugin: Arc<dyn Plugin>) {
        self.plugins.register(actions, plugin);
    }

    /// True when at least one plugin still declares `action`.
    pub fn has_capability(&self, action: Actions) -> bool {
        self.plugins.has(action)
    }

    pub(crate) fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn chain_id(&self) -> u64 {
        self.settings.read().chain_id
    }

    pub fn keep_in3(&self) -> bool {
        self.settings.read().keep_in3
    }

    pub fn max_pending(&self) -> usize {
        self.settings.read().max_pending
    }

    pub fn driver_options(&self) -> &DriverOptions {
        &self.driver
    }

    /// True when `method` matches one of the configured forward prefixes.
    pub fn forwards(&self, method: &str) -> bool {
        self.settings
            .read()
            .forward
            .iter()
            .any(|prefix| method.starts_with(prefix.as_str()))
    }

    /// Number of live contexts created on this client.
    pub fn pending(&self) -> usize {
        self.counters.lock().pending
    }

    pub(crate) fn reserve_pending(&self) -> Result<(), RequestError> {
        let limit = self.max_pending();
        let mut counters = self.counters.lock();
        if counters.pending >= limit {
            PendingLimitReached {
                pending: counters.pending,
                limit,
            }
            .log();
            return Err(RequestError::new(
                ErrorKind::ResourceExhausted,
                format!("too many pending requests ({})", counters.pending),
            ));
        }
        counters.pending += 1;
        Ok(())
    }

    pub(crate) fn release_pending(&self) {
        let mut counters = self.counters.lock();
        counters.pending = counters.pending.saturating_sub(1);
    }

    /// Reserve `count` consecutive request ids and return the first.
    pub(crate) fn next_ids(&self, count: usize) -> u64 {
        let mut counters = self.counters.lock();
        let first = counters.next_id;
        counters.next_id += count.max(1) as u64;
        first
    }

    pub(crate) fn init_plugins(&self) -> Result<(), RequestError> {
        if !self.plugins.has(Actions::INIT) {
            return Ok(());
        }
        self.plugins.broadcast_once(Actions::INIT, |p| p.init())
    }

    pub(crate) fn report_error(&self, event: &ErrorLogEvent<'_>) {
        if self.plugins.has(Actions::LOG_ERROR) {
            self.plugins.fan_out(Actions::LOG_ERROR, |p| p.log_error(event));
        }
    }

    /// Apply a JSON configuration object. Core keys are handled here; any other
    /// key must be claimed by a `CONFIG_SET` plugin.
    pub fn configure(&self, config: &Value) -> Result<(), RequestError> {
        let entries = config
            .as_object()
            .ok_or_else(|| RequestError::invalid_parameter("configuration must be a JSON object"))?;

        for (key, value) in entries {
            match key.as_str() {
                "chainId" | "chain_id" => {
                    let chain_id = parse_u64(value)
                        .filter(|id| *id > 0)
                        .ok_or_else(|| invalid_value(key))?;
                    self.settings.write().chain_id = chain_id;
                }
                "maxPending" | "max_pending" => {
                    let limit = value
                        .as_u64()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| invalid_value(key))?;
                    self.settings.write().max_pending = limit as usize;
                }
                "keepIn3" | "keep_in3" => {
                    self.settings.write().keep_in3 = value.as_bool().ok_or_else(|| invalid_value(key))?;
                }
                _ => {
                    self.plugins.first_applicable(
                        Actions::CONFIG_SET,
                        |p| p.config_set(key, value),
                        || RequestError::invalid_parameter(format!("unknown config key '{}'", key)),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Current configuration, including what plugins contribute via `CONFIG_GET`.
    pub fn config_json(&self) -> Value {
        let settings = self.settings.read().clone();
        let mut out = Map::new();
        out.insert("chainId".into(), json!(settings.chain_id));
        out.insert("maxPending".into(), json!(settings.max_pending));
        out.insert("keepIn3".into(), json!(settings.keep_in3));
        if !settings.forward.is_empty() {
            out.insert("forward".into(), json!(settings.forward));
        }
        self.plugins
            .fan_out(Actions::CONFIG_GET, |p| p.config_get(&mut out));
        Value::Object(out)
    }

    /// Every account any `SIGN_ACCOUNT` plugin can sign for, in registration order.
    pub fn accounts(&self) -> Vec<Vec<u8>> {
        self.plugins
            .fan_out(Actions::SIGN_ACCOUNT, |p| p.sign_accounts())
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn public_key(&self, account: Option<&[u8]>) -> Result<Vec<u8>, RequestError> {
        let handled = self.plugins.first_applicable(
            Actions::SIGN_PUBLICKEY,
            |p| p.sign_public_key(account),
            || RequestError::not_supported("no signer holds the requested public key"),
        )?;
        match handled {
            Handled::Done(key) => Ok(key),
            _ => Err(RequestError::not_supported("public key is not available yet")),
        }
    }

    /// Sign the hash of an outgoing request for a payment provider.
    pub fn sign_payment_request(&self, request_hash: &[u8; 32]) -> Result<Vec<u8>, RequestError> {
        let handled = self.plugins.first_applicable(
            Actions::PAY_SIGN_REQ,
            |p| p.sign_payment(request_hash),
            || RequestError::not_supported("no request signer registered"),
        )?;
        match handled {
            Handled::Done(signature) => Ok(signature),
            _ => Err(RequestError::not_supported("request signature is not available yet")),
        }
    }

    /// Deliver `TERM` to every plugin. Runs once; later calls and the drop are no-ops.
    pub fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        let (plugin_count, failures) = self.plugins.teardown(Actions::TERM, |p| p.term());
        ClientTeardown {
            plugin_count,
            failures,
        }
        .log();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builds a client whose plugins can claim the configuration's plugin settings.
pub struct ClientBuilder {
    config: ClientConfig,
    plugins: Vec<(Actions, Arc<dyn Plugin>)>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            plugins: Vec::new(),
        }
    }

    pub fn plugin(mut self, actions: Actions, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push((actions, plugin));
        self
    }

    /// Validate the config, register its local plugins followed by the
    /// builder's, then hand `plugins` settings to `CONFIG_SET`.
    pub fn build(self) -> anyhow::Result<Arc<Client>> {
        let plugin_settings = Value::Object(self.config.plugins.clone().into_iter().collect());
        let local_plugins = self.config.local_plugins.clone();
        let client = Client::from_config(self.config)?;
        for name in &local_plugins {
            let (actions, plugin) =
                LocalPluginFactory::create_plugin(name).map_err(anyhow::Error::msg)?;
            client.register(actions, plugin);
        }
        for (actions, plugin) in self.plugins {
            client.register(actions, plugin);
        }
        client.configure(&plugin_settings)?;
        Ok(client)
    }
}

pub(crate) fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
}

fn invalid_value(key: &str) -> RequestError {
    RequestError::invalid_parameter(format!("invalid value for config key '{}'", key))
}
