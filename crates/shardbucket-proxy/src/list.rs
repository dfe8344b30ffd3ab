//! Scatter-gather listing across the bucket set.
//!
//! ListObjectsV2 against the virtual bucket fans out one backend list call
//! per physical bucket, merges every fragment into one byte-lexicographic
//! ordering, and paginates the merged view with an opaque cursor. Any single
//! shard failure aborts the whole call; there is no partial-result
//! degradation and no per-bucket retry.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use shardbucket_core::{ProxyConfig, ProxyResult};
use shardbucket_model::{CommonPrefix, ListBucketResult, ListQuery, ObjectEntry};
use tracing::debug;

use crate::cursor::Cursor;
use crate::forward::{Forwarder, shard_list_query};

/// Per-bucket over-fetch cap. Each shard may hold an arbitrary fraction of
/// the matching keys, so every shard is asked for a full page regardless of
/// the client's `max-keys`.
const FAN_OUT_MAX_KEYS: i32 = 1000;

/// Merges per-bucket list fragments into one client-facing result.
#[derive(Debug)]
pub struct ListOrchestrator {
    config: Arc<ProxyConfig>,
    forwarder: Arc<Forwarder>,
}

impl ListOrchestrator {
    /// Create an orchestrator over the shared forwarder.
    #[must_use]
    pub fn new(config: Arc<ProxyConfig>, forwarder: Arc<Forwarder>) -> Self {
        Self { config, forwarder }
    }

    /// Run one orchestrated ListObjectsV2 call.
    ///
    /// # Errors
    ///
    /// Returns [`shardbucket_core::ProxyError::BadRequest`] for a malformed
    /// continuation token and [`shardbucket_core::ProxyError::Upstream`] if
    /// any shard's list call fails.
    pub async fn list(&self, query: &ListQuery) -> ProxyResult<ListBucketResult> {
        let cursor = query
            .continuation_token
            .as_deref()
            .map(Cursor::decode)
            .transpose()?;

        let fragments = try_join_all(self.config.buckets.iter().map(|bucket| {
            // Only the bucket the cursor names resumes from the cursor key;
            // a client start-after applies everywhere.
            let start_after = match (&cursor, &query.start_after) {
                (Some(c), _) if c.bucket == bucket => Some(c.key.as_str()),
                (Some(_), _) => None,
                (None, start_after) => start_after.as_deref(),
            };
            let pairs = shard_list_query(query, start_after, FAN_OUT_MAX_KEYS);
            async move { self.forwarder.list_shard(bucket, &pairs).await }
        }))
        .await?;

        let mut contents: Vec<ObjectEntry> = Vec::new();
        let mut prefixes: BTreeSet<String> = BTreeSet::new();
        for fragment in fragments {
            contents.extend(fragment.contents);
            prefixes.extend(fragment.common_prefixes.into_iter().map(|p| p.prefix));
        }

        // Fragments arrive bucket-grouped; S3 ordering is a global
        // byte-lexicographic sort over the merged keys.
        contents.sort_unstable_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
        let total = contents.len();

        // Resume after the cursor key, or the client's start-after when no
        // cursor was supplied. All entries at or before it were already
        // delivered; none remaining yields an empty page, not an error.
        let resume_key = cursor
            .as_ref()
            .map(|c| c.key.as_str())
            .or(query.start_after.as_deref());
        let start = match resume_key {
            Some(key) => contents.partition_point(|e| e.key.as_str() <= key),
            None => 0,
        };

        let page_len = usize::try_from(query.max_keys).unwrap_or(0);
        let mut page = contents.split_off(start.min(total));
        page.truncate(page_len);

        let remaining = total > start + page.len();
        let base_position = cursor.as_ref().map_or(0, |c| c.position);
        let next_continuation_token = match page.last() {
            Some(last) if remaining => {
                // The bucket is recomputed from the key, never trusted from
                // state, so the token always agrees with current routing.
                let next = Cursor {
                    bucket: self.config.buckets.pick(&last.key).to_owned(),
                    key: last.key.clone(),
                    position: base_position + page.len(),
                };
                Some(next.encode())
            }
            _ => None,
        };
        let is_truncated = next_continuation_token.is_some();

        debug!(
            total,
            start,
            returned = page.len(),
            is_truncated,
            "merged list fragments"
        );

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let key_count = (page.len() + prefixes.len()) as i32;

        Ok(ListBucketResult {
            name: self.config.virtual_bucket.clone(),
            prefix: query.prefix.clone(),
            delimiter: query.delimiter.clone(),
            key_count,
            max_keys: query.max_keys,
            is_truncated,
            contents: page,
            common_prefixes: prefixes.into_iter().map(CommonPrefix::new).collect(),
            continuation_token: query.continuation_token.clone(),
            next_continuation_token,
            start_after: query.start_after.clone(),
        })
    }
}
