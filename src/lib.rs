// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // plugin and transport backends
pub mod client;        // shared client state + plugin registry
pub mod config;        // config loading + validation
pub mod engine;        // async request driver
pub mod errors;        // error handling
pub mod observability;
pub mod plugins;       // actions + dispatch policies
pub mod request;       // request contexts, cache, sub-requests
pub mod signer;        // digests + signing protocol
pub mod traits;        // plugin / transport / key abstractions
pub mod utils;

pub use client::{Client, ClientBuilder};
pub use engine::RequestDriver;
pub use errors::{ErrorKind, RequestError};
pub use request::RequestContext;
