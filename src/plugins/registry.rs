// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plugin registrations and the dispatch policies used to invoke them.
//!
//! Every action is delivered under one named policy:
//!
//! | Policy                    | Actions                                       |
//! |---------------------------|-----------------------------------------------|
//! | [`broadcast_once`]        | `INIT`                                        |
//! | [`first_success_or_none`] | `SIGN`, `RPC_HANDLE`                          |
//! | [`first_applicable`]      | `CONFIG_SET`, `SIGN_PUBLICKEY`, `PAY_SIGN_REQ` |
//! | [`fan_out`]               | `SIGN_ACCOUNT`, `CONFIG_GET`, `LOG_ERROR`     |
//! | [`teardown`]              | `TERM`                                        |
//!
//! Dispatch never holds the registry lock while a handler runs, so handlers
//! may register further plugins.
//!
//! [`broadcast_once`]: PluginRegistry::broadcast_once
//! [`first_success_or_none`]: PluginRegistry::first_success_or_none
//! [`first_applicable`]: PluginRegistry::first_applicable
//! [`fan_out`]: PluginRegistry::fan_out
//! [`teardown`]: PluginRegistry::teardown

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::errors::RequestError;
use crate::observability::messages::plugin::{PluginActionFailed, PluginRegistered};
use crate::observability::messages::StructuredLog;
use crate::plugins::{Actions, Handled, PluginResult};
use crate::traits::Plugin;

/// A plugin plus the actions it still answers to.
struct Registration {
    actions: AtomicU64,
    plugin: Arc<dyn Plugin>,
}

impl Registration {
    fn declares(&self, action: Actions) -> bool {
        Actions::from_bits_truncate(self.actions.load(Ordering::Acquire)).contains(action)
    }

    fn clear(&self, action: Actions) {
        self.actions.fetch_and(!action.bits(), Ordering::AcqRel);
    }
}

/// Ordered plugin list. Registration order is dispatch order.
#[derive(Default)]
pub struct PluginRegistry {
    entries: RwLock<Vec<Arc<Registration>>>,
    summary: AtomicU64,
    init_guard: Mutex<()>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, actions: Actions, plugin: Arc<dyn Plugin>) {
        PluginRegistered {
            plugin: plugin.name(),
            actions: &actions.describe(),
        }
        .log();

        self.entries.write().push(Arc::new(Registration {
            actions: AtomicU64::new(actions.bits()),
            plugin,
        }));
        self.summary.fetch_or(actions.bits(), Ordering::AcqRel);
    }

    /// Union of the actions still declared by any plugin.
    pub fn summary(&self) -> Actions {
        Actions::from_bits_truncate(self.summary.load(Ordering::Acquire))
    }

    pub fn has(&self, action: Actions) -> bool {
        self.summary().contains(action)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.entries.read().iter().map(|r| r.plugin.name()).collect()
    }

    fn snapshot(&self, action: Actions) -> Vec<Arc<Registration>> {
        if !self.has(action) {
            return Vec::new();
        }
        self.entries
            .read()
            .iter()
            .filter(|r| r.declares(action))
            .cloned()
            .collect()
    }

    /// Deliver `action` to every declaring plugin, then forget that they
    /// declared it. An error stops the broadcast; plugins not yet reached keep
    /// their bit and are retried on the next call.
    pub fn broadcast_once<F>(&self, action: Actions, mut handler: F) -> Result<(), RequestError>
    where
        F: FnMut(&dyn Plugin) -> Result<(), RequestError>,
    {
        let _guard = self.init_guard.lock();
        for registration in self.snapshot(action) {
            handler(registration.plugin.as_ref())?;
            registration.clear(action);
        }
        self.summary.fetch_and(!action.bits(), Ordering::AcqRel);
        Ok(())
    }

    /// Walk plugins in order until one produces output. Declines (and
    /// `Done` with an empty payload, for byte outputs checked by the caller)
    /// move on. `Pending` and errors stop the walk. No taker yields `Declined`.
    pub fn first_success_or_none<T, F>(&self, action: Actions, mut handler: F) -> PluginResult<T>
    where
        F: FnMut(&dyn Plugin) -> PluginResult<T>,
    {
        for registration in self.snapshot(action) {
            match handler(registration.plugin.as_ref())? {
                Handled::Declined => continue,
                other => return Ok(other),
            }
        }
        Ok(Handled::Declined)
    }

    /// Like [`first_success_or_none`](Self::first_success_or_none), but having
    /// no taker is an error built by `unclaimed`.
    pub fn first_applicable<T, F, U>(
        &self,
        action: Actions,
        handler: F,
        unclaimed: U,
    ) -> PluginResult<T>
    where
        F: FnMut(&dyn Plugin) -> PluginResult<T>,
        U: FnOnce() -> RequestError,
    {
        match self.first_success_or_none(action, handler)? {
            Handled::Declined => Err(unclaimed()),
            other => Ok(other),
        }
    }

    /// Deliver `action` to every declaring plugin and collect what they
    /// produced. Failures are logged and skipped.
    pub fn fan_out<T, F>(&self, action: Actions, mut handler: F) -> Vec<T>
    where
        F: FnMut(&dyn Plugin) -> PluginResult<T>,
    {
        let mut collected = Vec::new();
        for registration in self.snapshot(action) {
            match handler(registration.plugin.as_ref()) {
                Ok(Handled::Done(value)) => collected.push(value),
                Ok(_) => {}
                Err(e) => PluginActionFailed {
                    plugin: registration.plugin.name(),
                    action: &action.describe(),
                    error: &e,
                }
                .log(),
            }
        }
        collected
    }

    /// Deliver `action` to every declaring plugin regardless of failures.
    /// Returns `(reached, failures)`.
    pub fn teardown<F>(&self, action: Actions, mut handler: F) -> (usize, usize)
    where
        F: FnMut(&dyn Plugin) -> Result<(), RequestError>,
    {
        let mut reached = 0;
        let mut failures = 0;
        for registration in self.snapshot(action) {
            reached += 1;
            if let Err(e) = handler(registration.plugin.as_ref()) {
                failures += 1;
                PluginActionFailed {
                    plugin: registration.plugin.name(),
                    action: &action.describe(),
                    error: &e,
                }
                .log();
            }
            registration.clear(action);
        }
        self.summary.fetch_and(!action.bits(), Ordering::AcqRel);
        (reached, failures)
    }
}
