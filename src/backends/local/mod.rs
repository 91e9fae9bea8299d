// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod plugins;

pub use factory::LocalPluginFactory;
pub use plugins::*;
