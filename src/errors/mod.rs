// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod driver;
mod request;

pub use config::ConfigError;
pub use driver::{DriverError, TransportError};
pub use request::{ErrorKind, RequestError, ERROR_DELIMITER};
pub(crate) use request::chain_messages;
