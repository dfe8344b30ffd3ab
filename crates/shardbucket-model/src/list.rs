//! List request and response shapes.

use crate::types::{CommonPrefix, ObjectEntry};

/// Default `MaxKeys` when the client does not supply one, matching S3.
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// A parsed ListObjectsV2 query.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Limit results to keys beginning with this prefix.
    pub prefix: Option<String>,
    /// Group keys sharing a prefix up to this delimiter.
    pub delimiter: Option<String>,
    /// Maximum number of keys in the response page.
    pub max_keys: i32,
    /// Opaque cursor from a previous truncated response.
    pub continuation_token: Option<String>,
    /// Start listing strictly after this key.
    pub start_after: Option<String>,
    /// Whether to include owner information in entries.
    pub fetch_owner: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            prefix: None,
            delimiter: None,
            max_keys: DEFAULT_MAX_KEYS,
            continuation_token: None,
            start_after: None,
            fetch_owner: false,
        }
    }
}

/// The parsed per-bucket list response: one fragment per backend per
/// orchestrated list call.
#[derive(Debug, Clone, Default)]
pub struct ListFragment {
    /// Object entries returned by this backend.
    pub contents: Vec<ObjectEntry>,
    /// Common prefixes this backend grouped under the delimiter.
    pub common_prefixes: Vec<CommonPrefix>,
}

/// The merged, client-facing `ListBucketResult` document.
#[derive(Debug, Clone, Default)]
pub struct ListBucketResult {
    /// The virtual bucket name.
    pub name: String,
    /// Echo of the request prefix.
    pub prefix: Option<String>,
    /// Echo of the request delimiter.
    pub delimiter: Option<String>,
    /// Number of keys plus common prefixes in this page.
    pub key_count: i32,
    /// Echo of the effective `MaxKeys`.
    pub max_keys: i32,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
    /// Object entries in byte-lexicographic key order.
    pub contents: Vec<ObjectEntry>,
    /// Deduplicated, sorted common prefixes.
    pub common_prefixes: Vec<CommonPrefix>,
    /// Echo of the continuation token the client supplied.
    pub continuation_token: Option<String>,
    /// Cursor for the next page when truncated.
    pub next_continuation_token: Option<String>,
    /// Echo of the request `start-after`.
    pub start_after: Option<String>,
}
