//! Core types, configuration, and routing for Shardbucket.
//!
//! This crate provides the foundational building blocks shared across the
//! proxy: the immutable process-wide configuration ([`ProxyConfig`]), the
//! ordered set of physical buckets ([`BucketSet`]) with its deterministic
//! key-to-bucket routing, and the proxy-wide error taxonomy ([`ProxyError`]).

mod config;
mod error;
mod routing;

pub use config::{BucketSet, CredentialPair, ProxyConfig};
pub use error::{ProxyError, ProxyResult};
