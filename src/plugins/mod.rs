// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod actions;
mod registry;

pub use actions::{
    Actions, ErrorLogEvent, Handled, PluginResult, RpcHandleContext, RpcOutcome, SignRequest,
};
pub use registry::PluginRegistry;
