//! Request handling for the sharding S3 proxy.
//!
//! This crate ties the pieces together: inbound requests are authenticated,
//! classified, and either forwarded to a single hash-routed bucket or fanned
//! out across every bucket for a merged listing. The [`service::ProxyService`]
//! type is the hyper entry point; everything else supports it.

mod body;
mod classify;
mod cursor;
mod forward;
mod list;
mod response;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use body::ProxyBody;
pub use classify::{RequestKind, classify};
pub use cursor::Cursor;
pub use forward::{Forwarder, HttpsTransport, SignedRequest, Transport, TransportResponse};
pub use list::ListOrchestrator;
pub use service::ProxyService;
