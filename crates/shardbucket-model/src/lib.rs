//! Data model for the cross-bucket list surface of Shardbucket.
//!
//! These are plain value types, request-scoped and owned: the query a client
//! sent ([`ListQuery`]), the per-backend fragment the orchestrator gathers
//! ([`ListFragment`]), and the merged document it returns
//! ([`ListBucketResult`]). Wire encoding and decoding live in
//! `shardbucket-xml`.

mod list;
mod types;

pub use list::{DEFAULT_MAX_KEYS, ListBucketResult, ListFragment, ListQuery};
pub use types::{CommonPrefix, ObjectEntry, Owner};
