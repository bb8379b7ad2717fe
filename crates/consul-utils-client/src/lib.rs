//! Consul HTTP client used by the utils provider
//!
//! This crate provides:
//! - Typed access to config entries (`exported-services`, `service-intentions`)
//! - KV get/put/delete
//! - ACL login for JWT bearer tokens

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;

pub use client::ConsulClient;
pub use config::ConsulClientConfig;
pub use error::{ConsulError, Result};
pub use model::*;
