// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for plugin registration and dispatch.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A plugin was attached to a client.
///
/// # Log Level
/// `info!`
pub struct PluginRegistered<'a> {
    pub plugin: &'a str,
    pub actions: &'a str,
}

impl Display for PluginRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered plugin '{}' for {}", self.plugin, self.actions)
    }
}

impl StructuredLog for PluginRegistered<'_> {
    fn log(&self) {
        tracing::info!(plugin = self.plugin, actions = self.actions, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("plugin", span_name = name, plugin = self.plugin)
    }
}

/// A plugin handler failed during an action that does not abort the caller.
///
/// # Log Level
/// `warn!`
pub struct PluginActionFailed<'a> {
    pub plugin: &'a str,
    pub action: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for PluginActionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Plugin '{}' failed handling {}: {}",
            self.plugin, self.action, self.error
        )
    }
}

impl StructuredLog for PluginActionFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            plugin = self.plugin,
            action = self.action,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "plugin_action_failed",
            span_name = name,
            plugin = self.plugin,
            action = self.action,
        )
    }
}

/// The client dispatched TERM to its plugins.
///
/// # Log Level
/// `info!`
pub struct ClientTeardown {
    pub plugin_count: usize,
    pub failures: usize,
}

impl Display for ClientTeardown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Client teardown: {} plugin(s) terminated, {} failure(s)",
            self.plugin_count, self.failures
        )
    }
}

impl StructuredLog for ClientTeardown {
    fn log(&self) {
        tracing::info!(
            plugin_count = self.plugin_count,
            failures = self.failures,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("teardown", span_name = name, plugin_count = self.plugin_count)
    }
}
