//! Deterministic key-to-bucket routing.
//!
//! Every object key maps to exactly one physical bucket for the lifetime of
//! a fixed [`BucketSet`]. The mapping hashes the full key with SHA-256 and
//! reduces the first eight bytes modulo the bucket count, so similar keys
//! (shared prefixes, equal lengths) still spread uniformly. A character-sum
//! router is deliberately not used: it skews badly for same-length keys.

use sha2::{Digest, Sha256};

use crate::config::BucketSet;

impl BucketSet {
    /// Pick the physical bucket for an object key.
    ///
    /// Deterministic, pure, and total: the same key always maps to the same
    /// bucket, including the empty key.
    ///
    /// # Examples
    ///
    /// ```
    /// use shardbucket_core::BucketSet;
    ///
    /// let set = BucketSet::parse("shard-0,shard-1,shard-2").unwrap();
    /// assert_eq!(set.pick("photos/cat.jpg"), set.pick("photos/cat.jpg"));
    /// ```
    #[must_use]
    pub fn pick(&self, key: &str) -> &str {
        let digest = Sha256::digest(key.as_bytes());
        // First 8 digest bytes as an unsigned big-endian integer. Unsigned
        // arithmetic keeps the modulo reduction free of negative indices.
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let hash = u64::from_be_bytes(prefix);

        // The modulo keeps the index in bounds; BucketSet is never empty.
        #[allow(clippy::cast_possible_truncation)]
        let index = (hash % self.0.len() as u64) as usize;
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_buckets() -> BucketSet {
        BucketSet::parse("shard-0,shard-1,shard-2").unwrap()
    }

    #[test]
    fn test_should_route_deterministically() {
        let set = three_buckets();
        for key in ["", "a", "file1.txt", "logs/2024/01/app.log", "\u{1f4e6}"] {
            assert_eq!(set.pick(key), set.pick(key));
        }
    }

    #[test]
    fn test_should_always_return_a_member_of_the_set() {
        let set = three_buckets();
        for i in 0..500 {
            let key = format!("object-{i}");
            assert!(set.contains(set.pick(&key)));
        }
    }

    #[test]
    fn test_should_handle_empty_key() {
        let set = three_buckets();
        assert!(set.contains(set.pick("")));
    }

    #[test]
    fn test_should_route_everything_to_a_single_bucket() {
        let set = BucketSet::parse("only").unwrap();
        assert_eq!(set.pick("anything"), "only");
        assert_eq!(set.pick(""), "only");
    }

    #[test]
    fn test_should_distribute_keys_approximately_uniformly() {
        let set = BucketSet::parse("a,b,c,d").unwrap();
        let mut counts = [0usize; 4];
        let total = 40_000;

        for i in 0..total {
            let key = format!("prefix/{i:08}.dat");
            let bucket = set.pick(&key);
            let idx = set.iter().position(|b| b == bucket).unwrap();
            counts[idx] += 1;
        }

        // Each bucket should hold 25% +/- 2 percentage points of the sample.
        let expected = total / 4;
        let tolerance = total * 2 / 100;
        for count in counts {
            assert!(
                count.abs_diff(expected) < tolerance,
                "skewed distribution: {counts:?}"
            );
        }
    }

    #[test]
    fn test_should_not_skew_for_same_length_keys() {
        // Same-length keys with a shared prefix are exactly the case where a
        // character-sum router collapses onto a few buckets.
        let set = BucketSet::parse("a,b,c").unwrap();
        let mut seen = std::collections::HashSet::new();
        for i in 0..100 {
            seen.insert(set.pick(&format!("img/{i:04}.png")).to_owned());
        }
        assert_eq!(seen.len(), 3, "all buckets should receive some keys");
    }
}
